//! Snapshot-based undo/redo.
//!
//! Each entry is a complete [`Snapshot`] of the board. Both stacks are capped
//! at the same depth; the oldest entry is evicted first.

use log::debug;
use std::collections::VecDeque;

use super::store::ObjectTable;
use crate::config::DEFAULT_MAX_UNDO_STEPS;
use crate::error::{Error, Result};
use crate::parts::PartsList;

/// The board at one point in time, plus the parts list when the caller
/// captured it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub objects: ObjectTable,
    pub parts: Option<PartsList>,
}

impl Snapshot {
    pub fn new(objects: ObjectTable, parts: Option<PartsList>) -> Self {
        Self { objects, parts }
    }
}

/// Undo/redo history for the board.
///
/// # Example
///
/// ```rust,ignore
/// let mut history = UndoRedoManager::new(10);
/// history.push(Snapshot::new(store.table(), None));
/// // ... mutate the store ...
/// let previous = history.undo(Snapshot::new(store.table(), None))?;
/// store.restore(previous.objects);
/// ```
#[derive(Debug, Clone)]
pub struct UndoRedoManager {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    max_size: usize,
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_STEPS)
    }
}

impl UndoRedoManager {
    /// Create a new history with the given maximum depth (at least 1).
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    /// Push a snapshot onto the undo stack and clear the redo stack.
    ///
    /// Returns `false`, changing nothing, when `snapshot` equals the current
    /// top of the undo stack.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.undo_stack.back() == Some(&snapshot) {
            debug!("Snapshot unchanged, not pushed");
            return false;
        }
        self.undo_stack.push_back(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
            debug!("Undo stack full, dropped the oldest snapshot");
        }
        true
    }

    /// Pop the latest snapshot, parking `current` on the redo stack.
    pub fn undo(&mut self, current: Snapshot) -> Result<Snapshot> {
        let previous = self.undo_stack.pop_back().ok_or(Error::NothingToUndo)?;
        push_capped(&mut self.redo_stack, current, self.max_size);
        debug!("Undo ({} left, {} redoable)", self.undo_stack.len(), self.redo_stack.len());
        Ok(previous)
    }

    /// Pop the latest undone snapshot, parking `current` on the undo stack.
    pub fn redo(&mut self, current: Snapshot) -> Result<Snapshot> {
        let next = self.redo_stack.pop_back().ok_or(Error::NothingToRedo)?;
        push_capped(&mut self.undo_stack, current, self.max_size);
        debug!("Redo ({} undoable, {} left)", self.undo_stack.len(), self.redo_stack.len());
        Ok(next)
    }

    /// Drop the redo stack; a fresh mutation invalidates it.
    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    /// Empty both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

fn push_capped(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, max_size: usize) {
    stack.push_back(snapshot);
    if stack.len() > max_size {
        stack.pop_front();
    }
}
