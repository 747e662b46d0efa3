//! # Undo/Redo Stack
//!
//! Tracks edit history and enables undo/redo operations.
//!
//! ## Design
//!
//! - Each edit records a snapshot of the content before and after it
//! - Undo restores the before snapshot and moves the batch to the redo stack
//! - Redo restores the after snapshot
//! - New edits clear the redo stack
//! - Consecutive typing coalesces into one batch until something else
//!   happens
//!
//! Snapshots cover the authoritative representation and the comment list
//! together, so undoing an edit that removed an anchor brings its comment
//! back as well.

use crate::annotations::CommentRecord;
use crate::document::Representation;
use crate::selection::Selection;

/// Content state an undo step restores
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub representation: Representation,
    pub comments: Vec<CommentRecord>,
    pub selection: Option<Selection>,
}

/// One undo step
#[derive(Debug, Clone)]
pub struct MutationBatch {
    pub before: Snapshot,
    pub after: Snapshot,

    /// Optional description of this batch
    pub description: Option<String>,
}

impl MutationBatch {
    pub fn new(before: Snapshot, after: Snapshot) -> Self {
        Self {
            before,
            after,
            description: None,
        }
    }

    /// Add a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Undo/redo stack for article editing
#[derive(Debug)]
pub struct UndoStack {
    /// Stack of applied batches (most recent last)
    undo_stack: Vec<MutationBatch>,

    /// Stack of undone batches (most recent last)
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// The top batch is typing that further keystrokes may extend
    typing_open: bool,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            typing_open: false,
        }
    }

    /// Record a completed edit
    pub fn record(&mut self, batch: MutationBatch) {
        self.typing_open = false;
        self.push_batch(batch);
    }

    /// Record a keystroke, extending the open typing batch if there is one
    pub fn record_typing(&mut self, before: Snapshot, after: Snapshot) {
        if self.typing_open {
            if let Some(batch) = self.undo_stack.last_mut() {
                batch.after = after;
                self.redo_stack.clear();
                return;
            }
        }

        self.push_batch(MutationBatch::new(before, after).with_description("typing"));
        self.typing_open = true;
    }

    /// Stop coalescing keystrokes (caret moved, command ran, ...)
    pub fn break_typing(&mut self) {
        self.typing_open = false;
    }

    /// Push a batch to the undo stack
    fn push_batch(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // Clear redo stack (new action invalidates future)
        self.redo_stack.clear();
    }

    /// Undo the most recent batch, returning the snapshot to restore
    pub fn undo(&mut self) -> Option<Snapshot> {
        self.typing_open = false;
        let batch = self.undo_stack.pop()?;
        let before = batch.before.clone();
        self.redo_stack.push(batch);
        Some(before)
    }

    /// Redo the most recently undone batch, returning the snapshot to restore
    pub fn redo(&mut self) -> Option<Snapshot> {
        self.typing_open = false;
        let batch = self.redo_stack.pop()?;
        let after = batch.after.clone();
        self.undo_stack.push(batch);
        Some(after)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.typing_open = false;
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(text: &str) -> Snapshot {
        Snapshot {
            representation: Representation::Markdown(text.to_string()),
            comments: Vec::new(),
            selection: None,
        }
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_record_and_undo() {
        let mut stack = UndoStack::new();
        stack.record(MutationBatch::new(snap("a"), snap("b")).with_description("bold"));

        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.undo_description(), Some("bold"));

        // Undo
        assert_eq!(stack.undo(), Some(snap("a")));
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 1);

        // Redo
        assert_eq!(stack.redo(), Some(snap("b")));
        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_typing_coalesces() {
        let mut stack = UndoStack::new();
        stack.record_typing(snap(""), snap("h"));
        stack.record_typing(snap("h"), snap("hi"));
        stack.record_typing(snap("hi"), snap("hi!"));

        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.undo_description(), Some("typing"));

        stack.break_typing();
        stack.record_typing(snap("hi!"), snap("hi!?"));
        assert_eq!(stack.undo_levels(), 2);

        assert_eq!(stack.undo(), Some(snap("hi!")));
        assert_eq!(stack.undo(), Some(snap("")));
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut stack = UndoStack::new();
        stack.record(MutationBatch::new(snap("a"), snap("b")));
        stack.undo();
        assert_eq!(stack.redo_levels(), 1);

        stack.record(MutationBatch::new(snap("a"), snap("c")));
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut stack = UndoStack::with_max_levels(2);
        for i in 0..3 {
            stack.record(MutationBatch::new(snap(&i.to_string()), snap("x")));
        }

        // Should only keep 2 (max levels)
        assert_eq!(stack.undo_levels(), 2);
        assert_eq!(stack.undo(), Some(snap("2")));
        assert_eq!(stack.undo(), Some(snap("1")));
        assert_eq!(stack.undo(), None);
    }
}
