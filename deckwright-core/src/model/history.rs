use crate::types::Document;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Immutable copy of the document after a command
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    document: Document,
    label: String,
    created_at: DateTime<Utc>,
}

impl HistorySnapshot {
    fn new(document: Document, label: &str) -> Self {
        Self {
            document,
            label: label.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Name of the command that produced this snapshot
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Bounded linear undo history.
///
/// Holds at least one snapshot (the initial document). The cursor points at
/// the snapshot matching the live document; committing after an undo drops
/// everything past the cursor.
#[derive(Debug)]
pub struct HistoryEngine {
    snapshots: VecDeque<HistorySnapshot>,
    cursor: usize,
    capacity: usize,
}

impl HistoryEngine {
    pub fn new(initial: Document, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut snapshots = VecDeque::with_capacity(capacity);
        snapshots.push_back(HistorySnapshot::new(initial, "initial"));
        Self {
            snapshots,
            cursor: 0,
            capacity,
        }
    }

    pub fn commit(&mut self, document: Document, label: &str) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(HistorySnapshot::new(document, label));
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back; `None` at the oldest retained snapshot
    pub fn undo(&mut self) -> Option<&Document> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor].document)
    }

    /// Step forward; `None` when nothing was undone
    pub fn redo(&mut self) -> Option<&Document> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor].document)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn current(&self) -> &HistorySnapshot {
        &self.snapshots[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.snapshots.iter().map(HistorySnapshot::label)
    }
}
