//! Undo/Redo history of whole-document snapshots.
//!
//! Every successful mutation pushes the pre-mutation `Document` onto the
//! undo stack and clears the redo stack. Snapshots share unchanged subtrees
//! with the live document through `Arc`, and since nodes are only ever
//! edited on private copies of their path, history can never be corrupted
//! by later edits.
//!
//! Continuous gestures (slider drags, colour scrubbing) use **batching**:
//! the document is captured at `begin_batch` and the whole gesture becomes
//! a single undo step at the matching `end_batch`.

use std::collections::VecDeque;
use vd_core::Document;

/// One history entry: the document as it was, plus what changed it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: Document,
    pub description: String,
}

/// Undo/redo stacks with batch grouping.
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// Maximum undo depth (0 = unbounded).
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Document captured when the outermost batch opened.
    batch_snapshot: Option<Snapshot>,
    /// Whether any mutation was recorded during the current batch.
    batch_dirty: bool,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
            batch_dirty: false,
        }
    }

    /// Record that `before` was replaced by a successful mutation.
    pub fn record(&mut self, before: Document, description: &str) {
        if self.batch_depth > 0 {
            // The batch snapshot already holds the pre-gesture state.
            self.batch_dirty = true;
            self.redo_stack.clear();
            return;
        }
        self.push_undo(Snapshot {
            document: before,
            description: description.to_string(),
        });
    }

    /// Start a batch group. Mutations until the matching `end_batch` are
    /// applied live but undone as one step.
    pub fn begin_batch(&mut self, current: &Document, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(Snapshot {
                document: current.clone(),
                description: description.to_string(),
            });
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// Close a batch group. When the outermost batch closes and the document
    /// actually changed, one snapshot is pushed.
    pub fn end_batch(&mut self, current: &Document) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        if let Some(snapshot) = self.batch_snapshot.take()
            && self.batch_dirty
            && snapshot.document != *current
        {
            self.push_undo(snapshot);
        }
        self.batch_dirty = false;
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Restore the most recent snapshot into `current`.
    /// Returns the undone step's description, or `None` if there is nothing
    /// to undo or a batch is still open.
    pub fn undo(&mut self, current: &mut Document) -> Option<String> {
        if self.is_batching() {
            return None;
        }
        let snapshot = self.undo_stack.pop_back()?;
        let description = snapshot.description.clone();
        let replaced = std::mem::replace(current, snapshot.document);
        self.redo_stack.push(Snapshot {
            document: replaced,
            description: snapshot.description,
        });
        Some(description)
    }

    /// Re-apply the most recently undone step. `None` while a batch is open.
    pub fn redo(&mut self, current: &mut Document) -> Option<String> {
        if self.is_batching() {
            return None;
        }
        let snapshot = self.redo_stack.pop()?;
        let description = snapshot.description.clone();
        let replaced = std::mem::replace(current, snapshot.document);
        self.undo_stack.push_back(Snapshot {
            document: replaced,
            description: snapshot.description,
        });
        self.trim();
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Drop every entry and any open batch.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_dirty = false;
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        self.trim();
        // A new action invalidates the redo branch.
        self.redo_stack.clear();
    }

    fn trim(&mut self) {
        if self.max_depth == 0 {
            return;
        }
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }
}
