//! Block store: the live document plus its history.
//!
//! Every accepted mutation builds the next document from a clone of the
//! current one and pushes it to history. No-ops (missing delete target,
//! out-of-range move) leave both untouched.

use tracing::debug;

use crate::editor::blocks::{Block, BlockId, BlockType, Document};
use crate::editor::builders::build_empty_block;
use crate::editor::history::History;
use crate::editor::EditorError;

/// Result of a structural edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Edit {
    Applied,
    Unchanged,
}

impl Edit {
    pub fn applied(self) -> bool {
        self == Edit::Applied
    }
}

#[derive(Debug, Default)]
pub struct BlockStore {
    document: Document,
    history: History,
}

impl BlockStore {
    /// Starts a store from a seeded document. The seed becomes the first,
    /// clean snapshot, so a freshly loaded store is not dirty.
    pub fn load(document: Document) -> Self {
        let mut history = History::new();
        history.push(&document);
        history.mark_clean();
        Self { document, history }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty(&self.document)
    }

    /// Appends an empty block of `block_type`. Returns the new block's id.
    pub fn add_block(&mut self, block_type: BlockType) -> BlockId {
        let block = build_empty_block(block_type);
        let id = block.id;
        let mut next = self.document.clone();
        next.blocks_mut().push(block);
        self.commit(next);
        debug!("Added {block_type} block {id}");
        id
    }

    /// Parses `type_name` and appends a block of that type.
    pub fn add_block_named(&mut self, type_name: &str) -> Result<BlockId, EditorError> {
        let block_type = type_name.parse::<BlockType>()?;
        Ok(self.add_block(block_type))
    }

    /// Removes the block with `id`. Missing ids are ignored.
    pub fn delete_block(&mut self, id: BlockId) -> Edit {
        let Some(index) = self.document.position(id) else {
            return Edit::Unchanged;
        };
        let mut next = self.document.clone();
        next.blocks_mut().remove(index);
        self.commit(next);
        debug!("Deleted block {id}");
        Edit::Applied
    }

    /// Replaces the block with `id` wholesale. The replacement must keep the
    /// same id and must not repeat entry ids.
    pub fn update_block(&mut self, id: BlockId, replacement: Block) -> Result<(), EditorError> {
        let index = self
            .document
            .position(id)
            .ok_or(EditorError::BlockNotFound(id))?;
        if replacement.id != id {
            return Err(EditorError::BlockIdMismatch {
                expected: id,
                found: replacement.id,
            });
        }
        if let Some(dup) = replacement.duplicate_entry_id() {
            return Err(EditorError::DuplicateEntryId(dup));
        }
        let mut next = self.document.clone();
        next.blocks_mut()[index] = replacement;
        self.commit(next);
        debug!("Updated block {id}");
        Ok(())
    }

    /// Swaps the block at `index` with its neighbour at `index + direction`.
    /// Anything out of range, or a direction other than ±1, is a no-op.
    pub fn move_block(&mut self, index: usize, direction: i32) -> Edit {
        if direction != 1 && direction != -1 {
            return Edit::Unchanged;
        }
        let Some(target) = index.checked_add_signed(direction as isize) else {
            return Edit::Unchanged;
        };
        if index >= self.document.len() || target >= self.document.len() {
            return Edit::Unchanged;
        }
        let mut next = self.document.clone();
        next.blocks_mut().swap(index, target);
        self.commit(next);
        debug!("Moved block {index} -> {target}");
        Edit::Applied
    }

    /// Steps back one snapshot. Does not record history.
    pub fn undo(&mut self) -> Edit {
        match self.history.undo() {
            Some(document) => {
                self.document = document;
                debug!("Undo -> cursor {:?}", self.history.cursor());
                Edit::Applied
            }
            None => Edit::Unchanged,
        }
    }

    /// Steps forward one snapshot. Does not record history.
    pub fn redo(&mut self) -> Edit {
        match self.history.redo() {
            Some(document) => {
                self.document = document;
                debug!("Redo -> cursor {:?}", self.history.cursor());
                Edit::Applied
            }
            None => Edit::Unchanged,
        }
    }

    /// Records a successfully persisted document as a new snapshot. The
    /// live document is left alone even if it moved on during the save.
    pub fn record_saved(&mut self, saved: &Document) {
        self.history.push(saved);
        self.history.mark_clean();
    }

    fn commit(&mut self, next: Document) {
        debug_assert!(next.ids_are_unique());
        self.history.push(&next);
        self.document = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::blocks::{BlockData, Entry, SummaryText};
    use crate::editor::builders::build_initial_blocks;
    use crate::models::profile::{ExperienceItem, ProfileSnapshot};
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn fresh_store() -> BlockStore {
        BlockStore::load(build_initial_blocks(&ProfileSnapshot::default()))
    }

    fn experience_block(store: &BlockStore) -> Block {
        store
            .document()
            .iter()
            .find(|b| b.block_type() == BlockType::Experience)
            .cloned()
            .unwrap()
    }

    fn with_intern(store: &mut BlockStore) {
        let mut block = experience_block(store);
        block.data = BlockData::Experience(vec![Entry::new(ExperienceItem {
            title: "Intern".to_string(),
            ..Default::default()
        })]);
        store.update_block(block.id, block).unwrap();
    }

    #[test]
    fn test_fresh_load_is_clean() {
        let store = fresh_store();
        assert!(!store.is_dirty());
        assert_eq!(store.history().len(), 1);
        assert!(!store.history().can_undo());
    }

    #[test]
    fn test_add_block_appends_and_records() {
        let mut store = fresh_store();
        let id = store.add_block(BlockType::Summary);
        assert_eq!(store.document().len(), 7);
        assert_eq!(store.document().blocks()[6].id, id);
        assert_eq!(store.history().len(), 2);
        assert!(store.document().ids_are_unique());
    }

    #[test]
    fn test_add_block_named_rejects_unknown_type() {
        let mut store = fresh_store();
        assert_matches!(
            store.add_block_named("hobbies"),
            Err(EditorError::InvalidBlockType(_))
        );
        assert_eq!(store.document().len(), 6);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_update_block_replaces_in_place() {
        let mut store = fresh_store();
        with_intern(&mut store);
        assert_matches!(&experience_block(&store).data, BlockData::Experience(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].fields.title, "Intern");
        });
        assert_eq!(store.document().blocks()[2].block_type(), BlockType::Experience);
    }

    #[test]
    fn test_update_missing_block_is_rejected() {
        let mut store = fresh_store();
        let before = store.document().clone();
        let missing = Uuid::new_v4();
        let replacement = Block {
            id: missing,
            collapsed: false,
            data: BlockData::Summary(SummaryText::default()),
        };
        assert_eq!(
            store.update_block(missing, replacement),
            Err(EditorError::BlockNotFound(missing))
        );
        assert_eq!(store.document(), &before);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_update_with_different_id_is_rejected() {
        let mut store = fresh_store();
        let target = store.document().blocks()[1].id;
        let mut replacement = store.document().blocks()[1].clone();
        replacement.id = Uuid::new_v4();
        assert_matches!(
            store.update_block(target, replacement),
            Err(EditorError::BlockIdMismatch { .. })
        );
    }

    #[test]
    fn test_update_with_duplicate_entries_is_rejected() {
        let mut store = fresh_store();
        let mut block = experience_block(&store);
        let entry = Entry::new(ExperienceItem::default());
        block.data = BlockData::Experience(vec![entry.clone(), entry]);
        assert_matches!(
            store.update_block(block.id, block),
            Err(EditorError::DuplicateEntryId(_))
        );
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_delete_block_is_idempotent() {
        let mut store = fresh_store();
        let id = store.document().blocks()[3].id;
        assert_eq!(store.delete_block(id), Edit::Applied);
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.delete_block(id), Edit::Unchanged);
        assert_eq!(store.delete_block(id), Edit::Unchanged);
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.document().len(), 5);
    }

    #[test]
    fn test_move_first_block_up_is_noop() {
        let mut store = fresh_store();
        let before = store.document().clone();
        assert_eq!(store.move_block(0, -1), Edit::Unchanged);
        assert_eq!(store.document(), &before);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_move_last_block_down_is_noop() {
        let mut store = fresh_store();
        assert_eq!(store.move_block(5, 1), Edit::Unchanged);
        assert_eq!(store.move_block(42, -1), Edit::Unchanged);
        assert_eq!(store.move_block(2, 3), Edit::Unchanged);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_move_block_swaps_neighbours() {
        let mut store = fresh_store();
        let first = store.document().blocks()[0].id;
        let second = store.document().blocks()[1].id;
        assert_eq!(store.move_block(0, 1), Edit::Applied);
        assert_eq!(store.document().blocks()[0].id, second);
        assert_eq!(store.document().blocks()[1].id, first);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_mutation_makes_store_dirty() {
        let mut store = fresh_store();
        store.add_block(BlockType::Skills);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_record_saved_clears_dirty() {
        let mut store = fresh_store();
        store.add_block(BlockType::Skills);
        let saved = store.document().clone();
        store.record_saved(&saved);
        assert!(!store.is_dirty());
        assert_eq!(store.history().len(), 3);

        // The saved copy sits on top of an identical edit snapshot.
        assert_eq!(store.undo(), Edit::Applied);
        assert!(!store.is_dirty());

        assert_eq!(store.undo(), Edit::Applied);
        assert!(store.is_dirty());
        assert_eq!(store.document().len(), 6);
    }

    #[test]
    fn test_undo_back_to_clean_state_is_not_dirty() {
        let mut store = fresh_store();
        store.add_block(BlockType::Summary);
        store.undo();
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_record_saved_keeps_diverged_live_document() {
        let mut store = fresh_store();
        let saved = store.document().clone();
        store.add_block(BlockType::Skills);
        let live = store.document().clone();
        store.record_saved(&saved);
        assert_eq!(store.document(), &live);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_undo_redo_scenario() {
        let mut store = fresh_store();
        with_intern(&mut store);

        assert_eq!(store.undo(), Edit::Applied);
        assert_matches!(&experience_block(&store).data, BlockData::Experience(e) if e.is_empty());

        assert_eq!(store.redo(), Edit::Applied);
        assert_matches!(&experience_block(&store).data, BlockData::Experience(e) => {
            assert_eq!(e.len(), 1);
            assert_eq!(e[0].fields.title, "Intern");
        });
    }

    #[test]
    fn test_undo_does_not_record_history() {
        let mut store = fresh_store();
        store.add_block(BlockType::Skills);
        store.add_block(BlockType::Summary);
        store.undo();
        assert_eq!(store.history().len(), 3);
        assert_eq!(store.history().cursor(), Some(1));
    }

    #[test]
    fn test_edit_after_undo_discards_redo() {
        let mut store = fresh_store();
        store.add_block(BlockType::Skills);
        store.add_block(BlockType::Summary);
        store.undo();
        store.undo();
        store.add_block(BlockType::Personal);
        assert_eq!(store.redo(), Edit::Unchanged);
        assert_eq!(store.document().len(), 7);
        assert_eq!(store.document().blocks()[6].block_type(), BlockType::Personal);
    }

    #[test]
    fn test_ids_stay_unique_across_mixed_edits() {
        let mut store = fresh_store();
        for round in 0..20 {
            let block_type = BlockType::ALL[round % BlockType::ALL.len()];
            let id = store.add_block(block_type);
            let _ = store.move_block(round % store.document().len(), if round % 2 == 0 { 1 } else { -1 });
            if round % 3 == 0 {
                let _ = store.delete_block(id);
            }
            if round % 4 == 0 {
                let mut block = store.document().blocks()[0].clone();
                block.collapsed = !block.collapsed;
                store.update_block(block.id, block).unwrap();
            }
            if round % 5 == 0 {
                let _ = store.undo();
            }
            assert!(store.document().ids_are_unique());
        }
    }
}
