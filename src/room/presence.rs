// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Ephemeral per-session state.
//!
//! Presence is broadcast to peers but never stored in the room. Each
//! session owns exactly one presence record and is the only writer of
//! it: updates are signed, and a peer only accepts an update whose
//! signature matches the author it claims to describe.
//!
//! Updates are per field. Every update carries the author's sequence
//! number, and a peer keeps a field only if the update is newer than the
//! last one that set that field, so reordered deliveries settle on the
//! author's latest value for each field.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::Serialize;

use crate::canvas::PixelColor;
use crate::canvas::Tool;
use crate::canvas::color::Rgb;
use crate::canvas::layer::Layer;
use crate::canvas::layer::LayerId;
use crate::error::Error;
use crate::key::KeyPair;
use crate::key::KeyPub;
use crate::key::Signature;

/// Type constant for presence digests.
pub const TYPE_PRESENCE: u8 = 0x20;

/// Where a user's pointer is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
    /// Brush footprint under the cursor, in cells.
    pub area: u32,
}

/// The active brush.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrushData {
    /// The color pixel edits write.
    pub color: PixelColor,
    pub opacity: f32,
    pub rgb: Rgb,
}

impl BrushData {
    /// A brush from channels and opacity.
    pub fn new(rgb: Rgb, opacity: f32) -> BrushData {
        let color = PixelColor::with_opacity(rgb, opacity);
        let opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        return BrushData { color, opacity, rgb };
    }

    /// A brush that paints exactly `color`, as the eyedropper picks it.
    pub fn from_color(color: PixelColor) -> BrushData {
        let rgb = color.rgb().unwrap_or_default();
        let opacity = match color {
            PixelColor::Rgba([_, _, _, a]) => a as f32 / 255.0,
            PixelColor::Transparent => 0.0,
            PixelColor::Rgb(_) => 1.0,
        };
        return BrushData { color, opacity, rgb };
    }
}

/// One session's presence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub name: String,
    pub brush: Option<BrushData>,
    pub selected_layer: LayerId,
    pub cursor: Option<Cursor>,
    pub tool: Tool,
    pub mouse_down: bool,
}

impl Presence {
    pub fn new(name: &str) -> Presence {
        return Presence {
            name: name.to_string(),
            brush: None,
            selected_layer: 0,
            cursor: None,
            tool: Tool::Brush,
            mouse_down: false,
        };
    }

    /// Overwrite one field. Returns true if the value changed.
    pub fn apply(&mut self, field: &PresenceField) -> bool {
        let changed = match field {
            PresenceField::Name(name) => self.name != *name,
            PresenceField::Brush(brush) => self.brush != *brush,
            PresenceField::SelectedLayer(id) => self.selected_layer != *id,
            PresenceField::Cursor(cursor) => self.cursor != *cursor,
            PresenceField::Tool(tool) => self.tool != *tool,
            PresenceField::MouseDown(down) => self.mouse_down != *down,
        };
        match field.clone() {
            PresenceField::Name(name) => self.name = name,
            PresenceField::Brush(brush) => self.brush = brush,
            PresenceField::SelectedLayer(id) => self.selected_layer = id,
            PresenceField::Cursor(cursor) => self.cursor = cursor,
            PresenceField::Tool(tool) => self.tool = tool,
            PresenceField::MouseDown(down) => self.mouse_down = down,
        }
        return changed;
    }

    /// Every field, for announcing a full presence on connect.
    pub fn fields(&self) -> Vec<PresenceField> {
        return vec![
            PresenceField::Name(self.name.clone()),
            PresenceField::Brush(self.brush),
            PresenceField::SelectedLayer(self.selected_layer),
            PresenceField::Cursor(self.cursor),
            PresenceField::Tool(self.tool),
            PresenceField::MouseDown(self.mouse_down),
        ];
    }
}

/// A single presence field update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "field", content = "value")]
pub enum PresenceField {
    Name(String),
    Brush(Option<BrushData>),
    SelectedLayer(LayerId),
    Cursor(Option<Cursor>),
    Tool(Tool),
    MouseDown(bool),
}

const FIELD_COUNT: usize = 6;

impl PresenceField {
    fn slot(&self) -> usize {
        return match self {
            PresenceField::Name(_) => 0,
            PresenceField::Brush(_) => 1,
            PresenceField::SelectedLayer(_) => 2,
            PresenceField::Cursor(_) => 3,
            PresenceField::Tool(_) => 4,
            PresenceField::MouseDown(_) => 5,
        };
    }
}

/// A batch of field updates from one session.
#[derive(Clone, Debug, PartialEq)]
pub struct PresenceUpdate {
    pub author: KeyPub,
    /// Strictly increasing per author.
    pub seq: u64,
    pub fields: Vec<PresenceField>,
}

/// A presence update plus its author's signature.
#[derive(Clone, Debug)]
pub struct SignedPresence {
    pub update: PresenceUpdate,
    pub signature: Signature,
}

impl PresenceUpdate {
    fn signable(&self) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[TYPE_PRESENCE]);
        hasher.update(&self.author.0);
        hasher.update(&self.seq.to_le_bytes());
        // Field values are plain data, so serialization cannot fail.
        let encoded = serde_json::to_vec(&self.fields).unwrap_or_default();
        hasher.update(&(encoded.len() as u64).to_le_bytes());
        hasher.update(&encoded);
        return hasher.finalize().as_bytes().to_vec();
    }

    /// Sign this update. The keypair must be the author's.
    pub fn sign(self, keypair: &KeyPair) -> SignedPresence {
        debug_assert_eq!(keypair.key_pub, self.author);
        let signature = keypair.sign(&self.signable());
        return SignedPresence { update: self, signature };
    }
}

impl SignedPresence {
    pub fn verify(&self) -> bool {
        return self.update.author.verify(&self.update.signable(), &self.signature);
    }
}

#[derive(Clone, Debug)]
struct PeerPresence {
    presence: Presence,
    seqs: [u64; FIELD_COUNT],
}

/// The presence of every other session in the room. Read-only from this
/// session's point of view: it only changes through signed updates.
#[derive(Clone, Debug, Default)]
pub struct PresenceMap {
    peers: FxHashMap<KeyPub, PeerPresence>,
}

impl PresenceMap {
    pub fn new() -> PresenceMap {
        return PresenceMap::default();
    }

    /// Apply a signed update. Returns true if any field changed.
    pub fn apply(&mut self, signed: &SignedPresence) -> Result<bool, Error> {
        if !signed.verify() {
            log::warn!("rejecting presence with bad signature for {}", signed.update.author.short());
            return Err(Error::BadSignature);
        }
        let update = &signed.update;
        let peer = self.peers.entry(update.author).or_insert_with(|| PeerPresence {
            presence: Presence::new(""),
            seqs: [0; FIELD_COUNT],
        });

        let mut changed = false;
        for field in &update.fields {
            let slot = field.slot();
            if update.seq <= peer.seqs[slot] {
                continue;
            }
            peer.seqs[slot] = update.seq;
            changed |= peer.presence.apply(field);
        }
        return Ok(changed);
    }

    /// Forget a disconnected session.
    pub fn remove(&mut self, author: &KeyPub) -> Option<Presence> {
        return self.peers.remove(author).map(|p| p.presence);
    }

    pub fn get(&self, author: &KeyPub) -> Option<&Presence> {
        return self.peers.get(author).map(|p| &p.presence);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyPub, &Presence)> {
        return self.peers.iter().map(|(k, p)| (k, &p.presence));
    }

    pub fn len(&self) -> usize {
        return self.peers.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.peers.is_empty();
    }
}

/// The layer a selection should move to, if `selected` no longer exists.
///
/// Returns `None` when no repair is needed, or when there is no layer to
/// repair to. The replacement is the last remaining layer (highest id).
pub fn repair_selected_layer(selected: LayerId, layers: &BTreeMap<LayerId, Layer>) -> Option<LayerId> {
    if layers.contains_key(&selected) {
        return None;
    }
    return layers.keys().next_back().copied();
}
