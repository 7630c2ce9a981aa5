// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Local undo/redo.
//!
//! Each recorded mutation is stored as a pair of op lists: the ops that
//! revert it and the ops that reapply it. Only this replica's own
//! mutations are recorded; undo never reverts a peer's work directly.
//!
//! While paused, every recorded mutation is folded into one pending entry
//! so a whole drag stroke undoes as a single step. Folding keeps the
//! *first* revert op per key (the value before the stroke) and the *last*
//! reapply op per key (the value after it).
//!
//! The undo stack can be capped; past the cap the oldest entries are
//! dropped.

use rustc_hash::FxHashSet;

use crate::crdt::op::Op;
use crate::crdt::op::Target;
use crate::crdt::op::coalesce;

/// One undoable step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    pub undo: Vec<Op>,
    pub redo: Vec<Op>,
}

impl Entry {
    fn is_empty(&self) -> bool {
        return self.undo.is_empty() && self.redo.is_empty();
    }

    fn fold(&mut self, undo: Vec<Op>, redo: Vec<Op>) {
        let seen: FxHashSet<Target> = self.undo.iter().map(|op| op.target()).collect();
        self.undo.extend(undo.into_iter().filter(|op| !seen.contains(&op.target())));
        self.redo.extend(redo);
        self.redo = coalesce(std::mem::take(&mut self.redo));
    }
}

/// Undo and redo stacks with a pause gate.
#[derive(Clone, Debug, Default)]
pub struct History {
    undo: Vec<Entry>,
    redo: Vec<Entry>,
    pending: Option<Entry>,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> History {
        return History::default();
    }

    /// Keep at most `limit` undo entries, dropping the oldest.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
        self.trim();
    }

    fn trim(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        if self.undo.len() > limit {
            let excess = self.undo.len() - limit;
            self.undo.drain(..excess);
        }
    }

    fn push(&mut self, entry: Entry) {
        self.undo.push(entry);
        self.redo.clear();
        self.trim();
    }

    /// Record a mutation. Clears the redo stack.
    pub fn record(&mut self, undo: Vec<Op>, redo: Vec<Op>) {
        if let Some(pending) = &mut self.pending {
            pending.fold(undo, redo);
            return;
        }
        let entry = Entry { undo, redo };
        if entry.is_empty() {
            return;
        }
        self.push(entry);
    }

    /// Start folding recorded mutations together. Nested pauses are ignored.
    pub fn pause(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(Entry::default());
        }
    }

    /// Stop folding and push whatever was folded as one entry.
    pub fn resume(&mut self) {
        let Some(entry) = self.pending.take() else {
            return;
        };
        if entry.is_empty() {
            return;
        }
        self.push(entry);
    }

    pub fn is_paused(&self) -> bool {
        return self.pending.is_some();
    }

    /// Pop the newest entry and return the ops that revert it.
    /// A paused history is resumed first.
    pub fn undo(&mut self) -> Option<Vec<Op>> {
        self.resume();
        let entry = self.undo.pop()?;
        let ops = entry.undo.clone();
        self.redo.push(entry);
        return Some(ops);
    }

    /// Pop the newest undone entry and return the ops that reapply it.
    pub fn redo(&mut self) -> Option<Vec<Op>> {
        self.resume();
        let entry = self.redo.pop()?;
        let ops = entry.redo.clone();
        self.undo.push(entry);
        self.trim();
        return Some(ops);
    }

    pub fn can_undo(&self) -> bool {
        return !self.undo.is_empty() || self.pending.as_ref().is_some_and(|e| !e.is_empty());
    }

    pub fn can_redo(&self) -> bool {
        return !self.redo.is_empty();
    }

    /// Number of entries on the undo stack (not counting a pending one).
    pub fn depth(&self) -> usize {
        return self.undo.len();
    }
}
