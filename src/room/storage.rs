// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! One replica of a room's shared state.
//!
//! The root holds two last-writer-wins maps, `pixelStorage` (flat pixel
//! key to color) and `layerStorage` (layer id to metadata), plus the
//! canvas info register. All local writes go through `mutate`, which
//! turns a list of ops into one stamped, signed batch:
//!
//! 1. ops are coalesced so each key is written once,
//! 2. the revert ops are captured from the current values,
//! 3. every op is applied under the batch's single stamp,
//! 4. subscribers are notified once, with the combined change.
//!
//! Remote batches go through `apply_remote`, which checks the room and
//! the author's signature, advances the Lamport clock, and applies the
//! batch the same way (without touching history).

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::canvas::CanvasInfo;
use crate::canvas::PixelColor;
use crate::canvas::layer::Layer;
use crate::canvas::layer::LayerId;
use crate::canvas::pixel_key;
use crate::crdt::Crdt;
use crate::crdt::LwwMap;
use crate::crdt::LwwRegister;
use crate::crdt::op::Batch;
use crate::crdt::op::Op;
use crate::crdt::op::RoomId;
use crate::crdt::op::SignedBatch;
use crate::crdt::op::Target;
use crate::crdt::op::coalesce;
use crate::crdt::op::room_id;
use crate::crdt::primitives::LamportClock;
use crate::crdt::primitives::Stamp;
use crate::error::Error;
use crate::key::KeyPair;
use crate::key::KeyPub;
use crate::room::history::History;

/// Handle returned by `subscribe`.
pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&Change)>;

/// What one applied batch (or merge) changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Change {
    pub pixels: bool,
    pub layers: bool,
    pub canvas: bool,
    /// True when the change came from this replica.
    pub local: bool,
}

impl Change {
    pub fn is_empty(&self) -> bool {
        return !(self.pixels || self.layers || self.canvas);
    }
}

/// A plain copy of the live state, as the storage provider persists it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub pixel_storage: BTreeMap<String, PixelColor>,
    pub layer_storage: BTreeMap<LayerId, Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasInfo>,
}

/// A replica of the room root.
pub struct Storage {
    room: RoomId,
    keypair: KeyPair,
    clock: LamportClock,
    pixels: LwwMap<String, PixelColor>,
    layers: LwwMap<LayerId, Layer>,
    canvas: LwwRegister<CanvasInfo>,
    history: History,
    outbox: Vec<SignedBatch>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl Storage {
    /// An empty replica of the named room.
    pub fn new(room: &str, keypair: KeyPair) -> Storage {
        return Storage {
            room: room_id(room),
            keypair,
            clock: LamportClock::new(),
            pixels: LwwMap::new(),
            layers: LwwMap::new(),
            canvas: LwwRegister::new(),
            history: History::new(),
            outbox: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
        };
    }

    /// A replica seeded from a persisted snapshot.
    ///
    /// Seeded values carry time 0, so any real write to the same key wins.
    pub fn from_snapshot(room: &str, keypair: KeyPair, snapshot: Snapshot) -> Storage {
        let mut storage = Storage::new(room, keypair);
        let stamp = Stamp::new(0, storage.replica());
        for (key, color) in snapshot.pixel_storage {
            storage.pixels.apply(key, Some(color), stamp);
        }
        for (id, layer) in snapshot.layer_storage {
            storage.layers.apply(id, Some(Layer { id, ..layer }), stamp);
        }
        if let Some(info) = snapshot.canvas {
            storage.canvas.apply(Some(info), stamp);
        }
        return storage;
    }

    /// Parse a JSON snapshot and seed a replica from it.
    pub fn from_json(room: &str, keypair: KeyPair, json: &str) -> Result<Storage, Error> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        return Ok(Storage::from_snapshot(room, keypair, snapshot));
    }

    /// This replica's identity.
    pub fn replica(&self) -> KeyPub {
        return self.keypair.key_pub;
    }

    pub fn room(&self) -> RoomId {
        return self.room;
    }

    pub fn pixels(&self) -> &LwwMap<String, PixelColor> {
        return &self.pixels;
    }

    pub fn layers(&self) -> &LwwMap<LayerId, Layer> {
        return &self.layers;
    }

    pub fn canvas(&self) -> Option<&CanvasInfo> {
        return self.canvas.get();
    }

    pub fn pixel_snapshot(&self) -> BTreeMap<String, PixelColor> {
        return self.pixels.snapshot();
    }

    pub fn layer_snapshot(&self) -> BTreeMap<LayerId, Layer> {
        return self.layers.snapshot();
    }

    /// A canvas exists once its info or at least one layer does.
    pub fn is_initialized(&self) -> bool {
        return self.canvas.get().is_some() || !self.layers.is_empty();
    }

    pub fn snapshot(&self) -> Snapshot {
        return Snapshot {
            pixel_storage: self.pixel_snapshot(),
            layer_storage: self.layer_snapshot(),
            canvas: self.canvas().cloned(),
        };
    }

    pub fn to_json(&self) -> Result<String, Error> {
        return Ok(serde_json::to_string(&self.snapshot())?);
    }

    /// Register a callback run once per applied batch or merge.
    pub fn subscribe(&mut self, callback: impl FnMut(&Change) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        return id;
    }

    /// Remove a callback. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        return self.subscribers.len() != before;
    }

    fn notify(&mut self, change: &Change) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(change);
        }
    }

    /// The op that would restore `target` to its current value.
    fn revert_op(&self, target: &Target) -> Option<Op> {
        return match target {
            Target::Pixel(key) => Some(match self.pixels.get(key) {
                Some(color) => Op::SetPixel { key: key.clone(), color: *color },
                None => Op::DeletePixel { key: key.clone() },
            }),
            Target::Layer(id) => Some(match self.layers.get(id) {
                Some(layer) => Op::SetLayer { layer: *layer },
                None => Op::DeleteLayer { id: *id },
            }),
            Target::Canvas => self.canvas.get().map(|info| Op::SetCanvas { info: info.clone() }),
        };
    }

    fn apply_batch(&mut self, batch: &Batch) -> Change {
        let mut change = Change::default();
        for op in &batch.ops {
            match op {
                Op::SetPixel { key, color } => {
                    change.pixels |= self.pixels.apply(key.clone(), Some(*color), batch.stamp);
                }
                Op::DeletePixel { key } => {
                    change.pixels |= self.pixels.apply(key.clone(), None, batch.stamp);
                }
                Op::SetLayer { layer } => {
                    change.layers |= self.layers.apply(layer.id, Some(*layer), batch.stamp);
                }
                Op::DeleteLayer { id } => {
                    change.layers |= self.layers.apply(*id, None, batch.stamp);
                }
                Op::SetCanvas { info } => {
                    change.canvas |= self.canvas.apply(Some(info.clone()), batch.stamp);
                }
            }
        }
        return change;
    }

    fn commit(&mut self, ops: Vec<Op>, record: bool) -> Option<Change> {
        let ops = coalesce(ops);
        if ops.is_empty() {
            return None;
        }
        if record {
            let undo: Vec<Op> = ops.iter().filter_map(|op| self.revert_op(&op.target())).collect();
            self.history.record(undo, ops.clone());
        }

        let stamp = Stamp::new(self.clock.tick(), self.replica());
        let batch = Batch { room: self.room, stamp, ops };
        let mut change = self.apply_batch(&batch);
        change.local = true;
        log::trace!(
            "{} committed batch t={} with {} ops",
            self.replica().short(),
            stamp.time,
            batch.ops.len()
        );

        self.outbox.push(batch.sign(&self.keypair));
        self.notify(&change);
        return Some(change);
    }

    /// Apply ops locally as one atomic batch and queue it for peers.
    /// Returns `None` when there was nothing to write.
    pub fn mutate(&mut self, ops: Vec<Op>) -> Option<Change> {
        return self.commit(ops, true);
    }

    /// Like `mutate`, but the batch never appears in undo history.
    pub fn mutate_untracked(&mut self, ops: Vec<Op>) -> Option<Change> {
        return self.commit(ops, false);
    }

    /// Apply a batch received from a peer.
    pub fn apply_remote(&mut self, signed: &SignedBatch) -> Result<Change, Error> {
        if signed.batch.room != self.room {
            log::warn!("rejecting batch for another room from {}", signed.batch.author().short());
            return Err(Error::WrongRoom);
        }
        if !signed.verify() {
            log::warn!("rejecting batch with bad signature from {}", signed.batch.author().short());
            return Err(Error::BadSignature);
        }

        self.clock.update(signed.batch.stamp.time);
        let change = self.apply_batch(&signed.batch);
        log::trace!(
            "{} applied remote batch t={} from {} ({} ops)",
            self.replica().short(),
            signed.batch.stamp.time,
            signed.batch.author().short(),
            signed.batch.ops.len()
        );
        if !change.is_empty() {
            self.notify(&change);
        }
        return Ok(change);
    }

    /// Take every signed batch produced since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<SignedBatch> {
        return std::mem::take(&mut self.outbox);
    }

    /// Suspend history so the following mutations undo as one step.
    pub fn pause_history(&mut self) {
        self.history.pause();
    }

    /// Close the step opened by `pause_history`.
    pub fn resume_history(&mut self) {
        self.history.resume();
    }

    /// Cap the number of undo steps kept.
    pub fn set_history_limit(&mut self, limit: usize) {
        self.history.set_limit(limit);
    }

    /// Drop the delete of one layer (and of its pixels) when `ops` would
    /// otherwise remove every live layer. Peers may have deleted the
    /// layers a history step did not know about.
    fn spare_last_layer(&self, ops: Vec<Op>) -> Vec<Op> {
        let deleted: BTreeSet<LayerId> = ops
            .iter()
            .filter_map(|op| match op {
                Op::DeleteLayer { id } => Some(*id),
                _ => None,
            })
            .collect();
        if deleted.is_empty() || ops.iter().any(|op| matches!(op, Op::SetLayer { .. })) {
            return ops;
        }
        let spared = match self.layers.iter().map(|(id, _)| *id).max() {
            Some(_) if self.layers.iter().any(|(id, _)| !deleted.contains(id)) => return ops,
            Some(id) => id,
            None => return ops,
        };

        log::debug!("{} keeping layer {} alive through history", self.replica().short(), spared);
        return ops
            .into_iter()
            .filter(|op| match op {
                Op::DeleteLayer { id } => *id != spared,
                Op::DeletePixel { key } => pixel_key::decode(key).map_or(true, |k| k.layer != spared),
                _ => true,
            })
            .collect();
    }

    /// Revert the newest local step.
    pub fn undo(&mut self) -> Option<Change> {
        let ops = self.history.undo()?;
        let ops = self.spare_last_layer(ops);
        return self.commit(ops, false);
    }

    /// Reapply the newest undone step.
    pub fn redo(&mut self) -> Option<Change> {
        let ops = self.history.redo()?;
        let ops = self.spare_last_layer(ops);
        return self.commit(ops, false);
    }

    pub fn history(&self) -> &History {
        return &self.history;
    }
}

impl Crdt for Storage {
    /// Full-state sync with another replica of the same room.
    fn merge(&mut self, other: &Self) {
        if other.room != self.room {
            log::warn!("refusing to merge replicas of different rooms");
            return;
        }
        let change = Change {
            pixels: self.pixels.merge_from(&other.pixels),
            layers: self.layers.merge_from(&other.layers),
            canvas: self.canvas.merge_from(&other.canvas),
            local: false,
        };
        self.clock.merge(&other.clock);

        if !change.is_empty() {
            self.notify(&change);
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(
            f,
            "Storage {{ replica: {}, time: {}, pixels: {}, layers: {} }}",
            self.replica().short(),
            self.clock.time(),
            self.pixels.len(),
            self.layers.len()
        );
    }
}
