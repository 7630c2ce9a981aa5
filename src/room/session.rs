// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! One user's view of a room.
//!
//! A `Session` ties a storage replica to the user's own presence and the
//! presence of everyone else. It is where tool gestures and layer
//! commands turn into batches:
//!
//! - every gesture is one `Storage::mutate` call, so peers see it whole,
//! - writes that would not change the stored value are dropped first,
//! - after every applied change (local or remote) the session checks that
//!   its selected layer still exists and repairs the selection if not,
//! - if concurrent deletes removed every layer of an existing canvas, the
//!   most recently deleted layer comes back empty.
//!
//! Missing state is never an error here. Editing before a canvas exists,
//! outside the canvas, or with a selected layer that is gone, is a logged
//! no-op.

use crate::canvas::CanvasInfo;
use crate::canvas::Direction;
use crate::canvas::FormattedLayer;
use crate::canvas::Grid;
use crate::canvas::PixelColor;
use crate::canvas::Tool;
use crate::canvas::compositor::format_layers;
use crate::canvas::layer::BlendMode;
use crate::canvas::layer::Layer;
use crate::canvas::layer::LayerId;
use crate::canvas::layer::exceeds_pixel_limit;
use crate::canvas::layer::next_layer_id;
use crate::canvas::pixel_key;
use crate::canvas::recent::RecentColors;
use crate::canvas::tool;
use crate::canvas::tool::PixelWrite;
use crate::canvas::transform;
use crate::config::Config;
use crate::crdt::Crdt;
use crate::crdt::op::Op;
use crate::crdt::op::SignedBatch;
use crate::error::Error;
use crate::key::KeyPair;
use crate::key::KeyPub;
use crate::room::presence::BrushData;
use crate::room::presence::Cursor;
use crate::room::presence::Presence;
use crate::room::presence::PresenceField;
use crate::room::presence::PresenceMap;
use crate::room::presence::PresenceUpdate;
use crate::room::presence::SignedPresence;
use crate::room::presence::repair_selected_layer;
use crate::room::storage::Change;
use crate::room::storage::Storage;

/// A connected user.
pub struct Session {
    keypair: KeyPair,
    config: Config,
    storage: Storage,
    presence: Presence,
    presence_seq: u64,
    presence_outbox: Vec<SignedPresence>,
    peers: PresenceMap,
    recent: RecentColors,
}

impl Session {
    /// Connect to a room with an empty replica and announce presence.
    pub fn join(room: &str, name: &str, keypair: KeyPair, config: Config) -> Session {
        let storage = Storage::new(room, keypair.clone());
        return Session::with_storage(storage, name, keypair, config);
    }

    /// Connect with an existing replica (for example one seeded from a
    /// snapshot). `keypair` must be the replica's.
    pub fn with_storage(mut storage: Storage, name: &str, keypair: KeyPair, config: Config) -> Session {
        let recent = RecentColors::new(config.recent_colors);
        storage.set_history_limit(config.undo_limit);
        let mut session = Session {
            keypair,
            config,
            storage,
            presence: Presence::new(name),
            presence_seq: 0,
            presence_outbox: Vec::new(),
            peers: PresenceMap::new(),
            recent,
        };
        session.repair_layers();
        session.repair_selection();
        session.announce();
        log::debug!("{} joined as {:?}", session.id().short(), name);
        return session;
    }

    pub fn id(&self) -> KeyPub {
        return self.keypair.key_pub;
    }

    pub fn config(&self) -> &Config {
        return &self.config;
    }

    pub fn storage(&self) -> &Storage {
        return &self.storage;
    }

    pub fn presence(&self) -> &Presence {
        return &self.presence;
    }

    pub fn peers(&self) -> &PresenceMap {
        return &self.peers;
    }

    pub fn recent_colors(&self) -> &RecentColors {
        return &self.recent;
    }

    /// Every layer with its derived grid.
    pub fn layers(&self) -> Vec<FormattedLayer> {
        return format_layers(&self.storage.pixel_snapshot(), &self.storage.layer_snapshot());
    }

    /// The selected layer's grid, if the layer exists.
    fn selected_grid(&self) -> Option<Grid> {
        let selected = self.presence.selected_layer;
        if !self.storage.layers().contains_key(&selected) {
            return None;
        }
        let grid = self.layers()
            .into_iter()
            .find(|formatted| formatted.layer.id == selected)
            .map(|formatted| formatted.grid)
            .unwrap_or_default();
        return Some(grid);
    }

    /// `(rows, cols)` of the canvas: the recorded size, else the extent of
    /// the first layer.
    fn canvas_dims(&self) -> Option<(u32, u32)> {
        if let Some(info) = self.storage.canvas() {
            return Some((info.height, info.width));
        }
        let first = self.layers().into_iter().next()?;
        return Some((first.grid.row_count() as u32, first.grid.col_count() as u32));
    }

    fn in_bounds(&self, row: u32, col: u32) -> bool {
        return self.canvas_dims().is_some_and(|(rows, cols)| row < rows && col < cols);
    }

    // ---------------------------------------------------------------------
    // Presence
    // ---------------------------------------------------------------------

    fn update_presence(&mut self, fields: Vec<PresenceField>) {
        let mut changed = Vec::new();
        for field in fields {
            if self.presence.apply(&field) {
                changed.push(field);
            }
        }
        if changed.is_empty() {
            return;
        }
        self.broadcast(changed);
    }

    fn broadcast(&mut self, fields: Vec<PresenceField>) {
        self.presence_seq += 1;
        let update = PresenceUpdate {
            author: self.id(),
            seq: self.presence_seq,
            fields,
        };
        self.presence_outbox.push(update.sign(&self.keypair));
    }

    /// Queue the full presence, as sent on connect.
    pub fn announce(&mut self) {
        let fields = self.presence.fields();
        self.broadcast(fields);
    }

    /// Point the selection at a live layer if it no longer references one.
    fn repair_selection(&mut self) {
        let layers = self.storage.layer_snapshot();
        if let Some(to) = repair_selected_layer(self.presence.selected_layer, &layers) {
            log::debug!(
                "{} selected layer {} is gone, selecting {}",
                self.id().short(),
                self.presence.selected_layer,
                to
            );
            self.update_presence(vec![PresenceField::SelectedLayer(to)]);
        }
    }

    /// Bring back one empty layer if the canvas exists but no layer does.
    ///
    /// Every replica in the same state restores the same layer, the one
    /// whose delete carries the highest stamp.
    fn repair_layers(&mut self) {
        let Some(info) = self.storage.canvas() else {
            return;
        };
        if !self.storage.layers().is_empty() {
            return;
        }
        let (rows, cols) = (info.height, info.width);
        let id = self.storage
            .layers()
            .tombstones()
            .max_by_key(|(_, stamp)| *stamp)
            .map_or(0, |(id, _)| *id);
        log::debug!("{} room lost every layer, restoring layer {}", self.id().short(), id);

        let mut ops = Vec::with_capacity((rows * cols) as usize + 1);
        for row in 0..rows {
            for col in 0..cols {
                ops.push(Op::SetPixel {
                    key: pixel_key::encode(id, row, col),
                    color: PixelColor::Transparent,
                });
            }
        }
        ops.push(Op::SetLayer { layer: Layer::new(id) });
        self.storage.mutate_untracked(ops);
    }

    fn after(&mut self, change: Option<Change>) -> Option<Change> {
        if change.is_some_and(|c| c.layers) {
            self.repair_layers();
            self.repair_selection();
        }
        return change;
    }

    /// Select a layer. Unknown ids are ignored.
    pub fn select_layer(&mut self, id: LayerId) -> bool {
        if !self.storage.layers().contains_key(&id) {
            log::debug!("select_layer: no layer {}", id);
            return false;
        }
        self.update_presence(vec![PresenceField::SelectedLayer(id)]);
        return true;
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.update_presence(vec![PresenceField::Tool(tool)]);
    }

    pub fn set_brush(&mut self, brush: BrushData) {
        self.update_presence(vec![PresenceField::Brush(Some(brush))]);
    }

    pub fn set_cursor(&mut self, cursor: Option<Cursor>) {
        self.update_presence(vec![PresenceField::Cursor(cursor)]);
    }

    pub fn set_name(&mut self, name: &str) {
        self.update_presence(vec![PresenceField::Name(name.to_string())]);
    }

    // ---------------------------------------------------------------------
    // Canvas and pixels
    // ---------------------------------------------------------------------

    /// Create the canvas: layer 0 with `width x height` transparent pixels.
    ///
    /// Returns `Ok(false)` if the room already has a canvas.
    pub fn create_canvas(&mut self, name: &str, width: u32, height: u32) -> Result<bool, Error> {
        if !self.config.canvas_size_ok(width, height) {
            return Err(Error::InvalidCanvasSize { width, height });
        }
        if self.storage.is_initialized() {
            log::debug!("create_canvas: room already has a canvas");
            return Ok(false);
        }

        let mut ops = Vec::with_capacity((width * height) as usize + 2);
        ops.push(Op::SetCanvas {
            info: CanvasInfo { name: name.to_string(), width, height },
        });
        for row in 0..height {
            for col in 0..width {
                ops.push(Op::SetPixel {
                    key: pixel_key::encode(0, row, col),
                    color: PixelColor::Transparent,
                });
            }
        }
        ops.push(Op::SetLayer { layer: Layer::new(0) });

        // The empty canvas is the floor of history, not an undoable step.
        let change = self.storage.mutate_untracked(ops);
        self.after(change);
        self.update_presence(vec![PresenceField::SelectedLayer(0)]);
        log::info!("created canvas {:?} ({}x{})", name, width, height);
        return Ok(true);
    }

    /// Writes for `writes` that would change the stored value.
    fn changed_ops(&self, writes: &[PixelWrite]) -> Vec<Op> {
        return writes
            .iter()
            .map(|w| (w.key.to_string(), w.color))
            .filter(|(key, color)| self.storage.pixels().get(key) != Some(color))
            .map(|(key, color)| Op::SetPixel { key, color })
            .collect();
    }

    /// Apply the active tool at `(row, col)` on the selected layer.
    pub fn apply_pixel_edit(&mut self, row: u32, col: u32, color: PixelColor) -> Option<Change> {
        let tool = self.presence.tool;
        let layer = self.presence.selected_layer;
        let Some(grid) = self.selected_grid() else {
            log::debug!("apply_pixel_edit: no canvas or no layer {}", layer);
            return None;
        };
        if !self.in_bounds(row, col) {
            log::debug!("apply_pixel_edit: ({}, {}) is outside the canvas", row, col);
            return None;
        }

        let writes = tool::apply_pixel_edit(tool, layer, &grid, row, col, color);
        if tool.applies_color() {
            self.recent.push(color);
        }
        let ops = self.changed_ops(&writes);
        let change = self.storage.mutate(ops);
        return self.after(change);
    }

    /// Start a drag. Brush and eraser strokes undo as one step.
    pub fn begin_stroke(&mut self) {
        if self.presence.tool != Tool::Fill {
            self.storage.pause_history();
        }
        self.update_presence(vec![PresenceField::MouseDown(true)]);
    }

    /// End a drag.
    pub fn end_stroke(&mut self) {
        self.storage.resume_history();
        self.update_presence(vec![PresenceField::MouseDown(false)]);
    }

    /// Shift the selected layer one cell.
    pub fn move_layer(&mut self, direction: Direction) -> Option<Change> {
        let layer = self.presence.selected_layer;
        if !self.storage.layers().contains_key(&layer) {
            log::debug!("move_layer: no layer {}", layer);
            return None;
        }
        let pixels = self.storage.pixel_snapshot();
        let writes = transform::move_pixels(direction, layer, &pixels);
        let vacated = transform::vacated_keys(layer, &pixels, &writes);

        let mut ops = self.changed_ops(&writes);
        ops.extend(vacated.into_iter().map(|key| Op::DeletePixel { key: key.to_string() }));
        let change = self.storage.mutate(ops);
        return self.after(change);
    }

    /// Pick the color under `(row, col)` on the selected layer into the
    /// brush. Transparent and unset cells pick nothing.
    pub fn pick_color(&mut self, row: u32, col: u32) -> Option<PixelColor> {
        if !self.in_bounds(row, col) {
            log::debug!("pick_color: ({}, {}) is outside the canvas", row, col);
            return None;
        }
        let grid = self.selected_grid()?;
        let color = grid.get(row, col).copied().filter(|c| !c.is_transparent())?;
        self.set_brush(BrushData::from_color(color));
        return Some(color);
    }

    // ---------------------------------------------------------------------
    // Layers
    // ---------------------------------------------------------------------

    /// Whether one more layer fits under `max_pixels`.
    pub fn can_add_layer(&self) -> bool {
        let Some((rows, cols)) = self.canvas_dims() else {
            return false;
        };
        let count = self.storage.layers().len() + 1;
        return !exceeds_pixel_limit(count, rows as usize, cols as usize, self.config.max_pixels);
    }

    /// Add a transparent layer on top and select it.
    pub fn add_layer(&mut self) -> Option<LayerId> {
        if !self.storage.is_initialized() {
            log::debug!("add_layer: no canvas");
            return None;
        }
        if !self.can_add_layer() {
            log::debug!("add_layer: would exceed {} pixels", self.config.max_pixels);
            return None;
        }
        let (rows, cols) = self.canvas_dims()?;
        let id = next_layer_id(&self.storage.layer_snapshot());

        let mut ops = Vec::with_capacity((rows * cols) as usize + 1);
        for row in 0..rows {
            for col in 0..cols {
                ops.push(Op::SetPixel {
                    key: pixel_key::encode(id, row, col),
                    color: PixelColor::Transparent,
                });
            }
        }
        ops.push(Op::SetLayer { layer: Layer::new(id) });

        let change = self.storage.mutate(ops);
        self.after(change);
        self.update_presence(vec![PresenceField::SelectedLayer(id)]);
        return Some(id);
    }

    /// Delete a layer and all its pixels. The last layer cannot be deleted.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        if self.storage.layers().len() <= 1 {
            log::debug!("delete_layer: refusing to delete the last layer");
            return false;
        }
        if !self.storage.layers().contains_key(&id) {
            return false;
        }

        let mut ops = vec![Op::DeleteLayer { id }];
        for (key, _) in self.storage.pixels().iter() {
            if pixel_key::decode(key).is_ok_and(|k| k.layer == id) {
                ops.push(Op::DeletePixel { key: key.clone() });
            }
        }
        let change = self.storage.mutate(ops);
        return self.after(change).is_some();
    }

    /// Flip a layer's `hidden` flag.
    pub fn toggle_visibility(&mut self, id: LayerId) -> Option<Change> {
        let layer = *self.storage.layers().get(&id)?;
        let change = self.storage.mutate(vec![Op::SetLayer {
            layer: Layer { hidden: !layer.hidden, ..layer },
        }]);
        return self.after(change);
    }

    /// Set the selected layer's opacity (clamped to `[0, 1]`).
    pub fn set_opacity(&mut self, opacity: f32) -> Option<Change> {
        let layer = *self.storage.layers().get(&self.presence.selected_layer)?;
        let updated = layer.with_opacity(opacity);
        if updated == layer {
            return None;
        }
        let change = self.storage.mutate(vec![Op::SetLayer { layer: updated }]);
        return self.after(change);
    }

    /// Set the selected layer's blend mode.
    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) -> Option<Change> {
        let layer = *self.storage.layers().get(&self.presence.selected_layer)?;
        if layer.blend_mode == blend_mode {
            return None;
        }
        let change = self.storage.mutate(vec![Op::SetLayer {
            layer: Layer { blend_mode, ..layer },
        }]);
        return self.after(change);
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    pub fn undo(&mut self) -> Option<Change> {
        let change = self.storage.undo();
        return self.after(change);
    }

    pub fn redo(&mut self) -> Option<Change> {
        let change = self.storage.redo();
        return self.after(change);
    }

    // ---------------------------------------------------------------------
    // Sync
    // ---------------------------------------------------------------------

    /// Apply a batch from a peer.
    pub fn receive(&mut self, batch: &SignedBatch) -> Result<Change, Error> {
        let change = self.storage.apply_remote(batch)?;
        self.after(Some(change));
        return Ok(change);
    }

    /// Apply a peer's presence update. Our own echoes are ignored.
    pub fn receive_presence(&mut self, update: &SignedPresence) -> Result<bool, Error> {
        if update.update.author == self.id() {
            return Ok(false);
        }
        return self.peers.apply(update);
    }

    /// Full-state sync from another replica, as on first connect.
    pub fn sync_from(&mut self, other: &Storage) {
        self.storage.merge(other);
        self.repair_layers();
        self.repair_selection();
    }

    /// Forget a peer that left.
    pub fn disconnect_peer(&mut self, id: &KeyPub) -> Option<Presence> {
        return self.peers.remove(id);
    }

    /// Take the batches produced since the last drain.
    pub fn drain_batches(&mut self) -> Vec<SignedBatch> {
        return self.storage.drain_outbox();
    }

    /// Take the presence updates produced since the last drain.
    pub fn drain_presence(&mut self) -> Vec<SignedPresence> {
        return std::mem::take(&mut self.presence_outbox);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f
            .debug_struct("Session")
            .field("id", &self.id().short())
            .field("presence", &self.presence)
            .field("storage", &self.storage)
            .finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: PixelColor = PixelColor::Rgb([255, 0, 0]);

    fn session() -> Session {
        return Session::join("room", "ada", KeyPair::generate(), Config::default());
    }

    #[test]
    fn edits_before_canvas_are_noops() {
        let mut s = session();
        assert_eq!(s.apply_pixel_edit(0, 0, RED), None);
        assert_eq!(s.move_layer(Direction::Up), None);
        assert_eq!(s.add_layer(), None);
        assert!(!s.delete_layer(0));
        assert!(s.layers().is_empty());
    }

    #[test]
    fn create_canvas_validates_size() {
        let mut s = session();
        assert_eq!(s.create_canvas("x", 1, 10), Err(Error::InvalidCanvasSize { width: 1, height: 10 }));
        assert_eq!(s.create_canvas("x", 4, 3), Ok(true));
        assert_eq!(s.create_canvas("x", 4, 3), Ok(false));

        let layers = s.layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].grid.row_count(), 3);
        assert_eq!(layers[0].grid.col_count(), 4);
        assert_eq!(s.storage().pixels().len(), 12);
        assert!(!s.storage().history().can_undo());
    }

    #[test]
    fn repainting_same_color_writes_nothing() {
        let mut s = session();
        s.create_canvas("x", 2, 2).unwrap();
        assert!(s.apply_pixel_edit(0, 0, RED).is_some());
        assert_eq!(s.apply_pixel_edit(0, 0, RED), None);
        assert_eq!(s.storage().history().depth(), 1);
    }

    #[test]
    fn pick_color_sets_brush() {
        let mut s = session();
        s.create_canvas("x", 2, 2).unwrap();
        s.apply_pixel_edit(1, 1, RED);
        assert_eq!(s.pick_color(0, 0), None);
        assert_eq!(s.pick_color(1, 1), Some(RED));
        assert_eq!(s.presence().brush.unwrap().color, RED);
    }

    #[test]
    fn edits_outside_canvas_are_noops() {
        let mut s = session();
        s.create_canvas("x", 4, 4).unwrap();
        assert_eq!(s.apply_pixel_edit(40, 40, RED), None);
        assert_eq!(s.apply_pixel_edit(0, 4, RED), None);
        assert_eq!(s.pick_color(4, 0), None);
        assert_eq!(s.storage().pixels().len(), 16);
        assert!(!s.storage().history().can_undo());
        assert!(s.recent_colors().is_empty());
    }
}
