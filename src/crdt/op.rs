// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Atomic multi-key mutations.
//!
//! Every local gesture becomes one `Batch`: a list of key writes that all
//! share a single stamp. A replica applies a batch in one step and only
//! then notifies observers, so nobody ever sees half a flood fill.
//!
//! Batches are signed by their author before they leave the replica. The
//! signed message is a domain-separated blake3 digest of the batch:
//!
//! ```text
//! [TYPE_BATCH] [room] [time] [replica] [op count] [op]*
//! op := [tag] [fields, strings length-prefixed]
//! ```

use rustc_hash::FxHashSet;

use crate::canvas::CanvasInfo;
use crate::canvas::PixelColor;
use crate::canvas::layer::Layer;
use crate::canvas::layer::LayerId;
use crate::crdt::primitives::Stamp;
use crate::key::Hash;
use crate::key::KeyPair;
use crate::key::KeyPub;
use crate::key::Signature;

/// Type constant for batch digests.
pub const TYPE_BATCH: u8 = 0x10;

const TAG_SET_PIXEL: u8 = 0x00;
const TAG_DELETE_PIXEL: u8 = 0x01;
const TAG_SET_LAYER: u8 = 0x02;
const TAG_DELETE_LAYER: u8 = 0x03;
const TAG_SET_CANVAS: u8 = 0x04;

/// Identifies a room. Batches from another room are rejected.
pub type RoomId = Hash;

/// Derive a room id from its external name.
pub fn room_id(name: &str) -> RoomId {
    return crate::key::hash(name.as_bytes());
}

/// One key write inside a batch.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Set a pixel store key.
    SetPixel { key: String, color: PixelColor },
    /// Tombstone a pixel store key.
    DeletePixel { key: String },
    /// Set a layer store entry. The key is `layer.id`.
    SetLayer { layer: Layer },
    /// Tombstone a layer store entry.
    DeleteLayer { id: LayerId },
    /// Set the canvas info register.
    SetCanvas { info: CanvasInfo },
}

/// The store key an op writes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Pixel(String),
    Layer(LayerId),
    Canvas,
}

impl Op {
    pub fn target(&self) -> Target {
        return match self {
            Op::SetPixel { key, .. } | Op::DeletePixel { key } => Target::Pixel(key.clone()),
            Op::SetLayer { layer } => Target::Layer(layer.id),
            Op::DeleteLayer { id } => Target::Layer(*id),
            Op::SetCanvas { .. } => Target::Canvas,
        };
    }
}

/// Drop every op that a later op in the list overwrites.
///
/// All ops of a batch share one stamp, so a key written twice in the same
/// batch must be reduced to its last write before it is applied.
pub fn coalesce(ops: Vec<Op>) -> Vec<Op> {
    let mut seen: FxHashSet<Target> = FxHashSet::default();
    let mut out: Vec<Op> = ops
        .into_iter()
        .rev()
        .filter(|op| seen.insert(op.target()))
        .collect();
    out.reverse();
    return out;
}

/// A stamped list of ops, applied all at once.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub room: RoomId,
    pub stamp: Stamp,
    pub ops: Vec<Op>,
}

/// A batch plus its author's signature.
#[derive(Clone, Debug)]
pub struct SignedBatch {
    pub batch: Batch,
    pub signature: Signature,
}

fn update_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

impl Batch {
    /// The author is whoever stamped the batch.
    pub fn author(&self) -> KeyPub {
        return self.stamp.replica;
    }

    /// Compute the message that gets signed.
    fn signable(&self) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[TYPE_BATCH]);
        hasher.update(&self.room.0);
        hasher.update(&self.stamp.time.to_le_bytes());
        hasher.update(&self.stamp.replica.0);
        hasher.update(&(self.ops.len() as u64).to_le_bytes());
        for op in &self.ops {
            match op {
                Op::SetPixel { key, color } => {
                    hasher.update(&[TAG_SET_PIXEL]);
                    update_str(&mut hasher, key);
                    update_str(&mut hasher, &color.to_string());
                }
                Op::DeletePixel { key } => {
                    hasher.update(&[TAG_DELETE_PIXEL]);
                    update_str(&mut hasher, key);
                }
                Op::SetLayer { layer } => {
                    hasher.update(&[TAG_SET_LAYER]);
                    hasher.update(&layer.id.to_le_bytes());
                    hasher.update(&layer.opacity.to_bits().to_le_bytes());
                    update_str(&mut hasher, layer.blend_mode.name());
                    hasher.update(&[layer.hidden as u8]);
                }
                Op::DeleteLayer { id } => {
                    hasher.update(&[TAG_DELETE_LAYER]);
                    hasher.update(&id.to_le_bytes());
                }
                Op::SetCanvas { info } => {
                    hasher.update(&[TAG_SET_CANVAS]);
                    update_str(&mut hasher, &info.name);
                    hasher.update(&info.width.to_le_bytes());
                    hasher.update(&info.height.to_le_bytes());
                }
            }
        }
        return hasher.finalize().as_bytes().to_vec();
    }

    /// Sign this batch. The keypair must be the stamp's replica.
    pub fn sign(self, keypair: &KeyPair) -> SignedBatch {
        debug_assert_eq!(keypair.key_pub, self.stamp.replica);
        let signature = keypair.sign(&self.signable());
        return SignedBatch { batch: self, signature };
    }
}

impl SignedBatch {
    /// Check that the stamp's replica signed exactly this batch.
    pub fn verify(&self) -> bool {
        let message = self.batch.signable();
        return self.batch.author().verify(&message, &self.signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(keypair: &KeyPair, ops: Vec<Op>) -> Batch {
        return Batch {
            room: room_id("test"),
            stamp: Stamp::new(1, keypair.key_pub),
            ops,
        };
    }

    #[test]
    fn signed_batch_verifies() {
        let alice = KeyPair::generate();
        let signed = batch(&alice, vec![
            Op::SetPixel { key: "0_0_0".into(), color: PixelColor::Rgb([1, 2, 3]) },
            Op::SetLayer { layer: Layer::new(0) },
        ]).sign(&alice);
        assert!(signed.verify());
    }

    #[test]
    fn tampered_op_fails() {
        let alice = KeyPair::generate();
        let mut signed = batch(&alice, vec![
            Op::SetPixel { key: "0_0_0".into(), color: PixelColor::Rgb([1, 2, 3]) },
        ]).sign(&alice);
        signed.batch.ops[0] = Op::SetPixel { key: "0_0_0".into(), color: PixelColor::Transparent };
        assert!(!signed.verify());
    }

    #[test]
    fn forged_author_fails() {
        let alice = KeyPair::generate();
        let mallory = KeyPair::generate();
        let mut signed = batch(&mallory, vec![Op::DeleteLayer { id: 0 }]).sign(&mallory);
        signed.batch.stamp.replica = alice.key_pub;
        assert!(!signed.verify());
    }

    #[test]
    fn key_boundaries_are_length_prefixed() {
        let alice = KeyPair::generate();
        let a = batch(&alice, vec![
            Op::DeletePixel { key: "0_1".into() },
            Op::DeletePixel { key: "_2".into() },
        ]);
        let b = batch(&alice, vec![
            Op::DeletePixel { key: "0_1_".into() },
            Op::DeletePixel { key: "2".into() },
        ]);
        assert_ne!(a.signable(), b.signable());
    }

    #[test]
    fn coalesce_keeps_last_write_per_key() {
        let red = PixelColor::Rgb([255, 0, 0]);
        let ops = vec![
            Op::SetPixel { key: "0_0_0".into(), color: red },
            Op::SetLayer { layer: Layer::new(1) },
            Op::DeletePixel { key: "0_0_0".into() },
            Op::DeleteLayer { id: 2 },
        ];
        let coalesced = coalesce(ops);
        assert_eq!(coalesced, vec![
            Op::SetLayer { layer: Layer::new(1) },
            Op::DeletePixel { key: "0_0_0".into() },
            Op::DeleteLayer { id: 2 },
        ]);
    }

    #[test]
    fn room_ids_differ_by_name() {
        assert_ne!(room_id("a"), room_id("b"));
        assert_eq!(room_id("a"), room_id("a"));
    }
}
