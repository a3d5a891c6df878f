//! Linear undo/redo over whole-document snapshots.
//!
//! Snapshots are owned clones, so mutating the live document can never
//! reach back into a stored snapshot. Applying an `undo`/`redo` result is
//! the caller's job and must not go through `push`.
//!
//! Dirtiness is measured against the last snapshot marked clean (the
//! loaded or last saved document), not against the cursor: every edit is
//! pushed, so the cursor snapshot always equals the live document.

use crate::editor::blocks::Document;

#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<Document>,
    /// `None` until the first push.
    cursor: Option<usize>,
    clean: Option<Document>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every snapshot after the cursor, then appends a copy of
    /// `document` and moves the cursor onto it.
    pub fn push(&mut self, document: &Document) {
        match self.cursor {
            Some(cursor) => self.snapshots.truncate(cursor + 1),
            None => self.snapshots.clear(),
        }
        self.snapshots.push(document.clone());
        self.cursor = Some(self.snapshots.len() - 1);
    }

    pub fn undo(&mut self) -> Option<Document> {
        let cursor = self.cursor.filter(|c| *c > 0)?;
        self.cursor = Some(cursor - 1);
        Some(self.snapshots[cursor - 1].clone())
    }

    pub fn redo(&mut self) -> Option<Document> {
        let cursor = self.cursor.filter(|c| c + 1 < self.snapshots.len())?;
        self.cursor = Some(cursor + 1);
        Some(self.snapshots[cursor + 1].clone())
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.snapshots.len())
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> Option<&Document> {
        self.cursor.map(|c| &self.snapshots[c])
    }

    /// Marks the snapshot under the cursor as matching persisted state.
    pub fn mark_clean(&mut self) {
        self.clean = self.current().cloned();
    }

    /// Whether `live` has diverged from the last clean snapshot.
    /// Always false before anything was marked clean.
    pub fn is_dirty(&self, live: &Document) -> bool {
        self.clean.as_ref().is_some_and(|clean| clean != live)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}
