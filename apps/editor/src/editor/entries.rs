//! Entry- and tag-level edits.
//!
//! The store only knows whole blocks, so every helper here takes the current
//! block and returns the replacement to hand to `BlockStore::update_block`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::editor::blocks::{Block, BlockData, Entry, EntryId};
use crate::editor::builders::{build_empty_entry, NewEntry};
use crate::editor::EditorError;

/// Flips the block's collapsed flag.
pub fn toggle_collapsed(block: &Block) -> Block {
    Block {
        collapsed: !block.collapsed,
        ..block.clone()
    }
}

/// Appends a blank entry. Returns the new block and the entry's id.
pub fn append_empty_entry(block: &Block) -> Result<(Block, EntryId), EditorError> {
    let entry = build_empty_entry(block.block_type())?;
    let entry_id = entry.id();
    let data = match (&block.data, entry) {
        (BlockData::Experience(list), NewEntry::Experience(e)) => {
            BlockData::Experience(appended(list, e))
        }
        (BlockData::Education(list), NewEntry::Education(e)) => {
            BlockData::Education(appended(list, e))
        }
        (BlockData::Projects(list), NewEntry::Project(e)) => BlockData::Projects(appended(list, e)),
        _ => return Err(EditorError::NotAListBlock(block.block_type())),
    };
    Ok((with_data(block, data), entry_id))
}

/// Replaces the fields of entry `entry_id` with `fields`, parsed according
/// to the block's type. Missing fields become empty; the id is kept.
pub fn replace_entry(block: &Block, entry_id: EntryId, fields: Value) -> Result<Block, EditorError> {
    let data = match &block.data {
        BlockData::Experience(list) => BlockData::Experience(replaced(list, entry_id, fields)?),
        BlockData::Education(list) => BlockData::Education(replaced(list, entry_id, fields)?),
        BlockData::Projects(list) => BlockData::Projects(replaced(list, entry_id, fields)?),
        _ => return Err(EditorError::NotAListBlock(block.block_type())),
    };
    Ok(with_data(block, data))
}

pub fn remove_entry(block: &Block, entry_id: EntryId) -> Result<Block, EditorError> {
    let data = match &block.data {
        BlockData::Experience(list) => BlockData::Experience(removed(list, entry_id)?),
        BlockData::Education(list) => BlockData::Education(removed(list, entry_id)?),
        BlockData::Projects(list) => BlockData::Projects(removed(list, entry_id)?),
        _ => return Err(EditorError::NotAListBlock(block.block_type())),
    };
    Ok(with_data(block, data))
}

/// Appends a trimmed skill tag. Blank input is rejected.
pub fn add_skill(block: &Block, skill: &str) -> Result<Block, EditorError> {
    let BlockData::Skills(skills) = &block.data else {
        return Err(EditorError::NotASkillsBlock(block.block_type()));
    };
    let skill = skill.trim();
    if skill.is_empty() {
        return Err(EditorError::EmptySkill);
    }
    let mut next = skills.clone();
    next.push(skill.to_string());
    Ok(with_data(block, BlockData::Skills(next)))
}

/// Removes the skill tag at `index`.
pub fn remove_skill(block: &Block, index: usize) -> Result<Block, EditorError> {
    let BlockData::Skills(skills) = &block.data else {
        return Err(EditorError::NotASkillsBlock(block.block_type()));
    };
    if index >= skills.len() {
        return Err(EditorError::SkillOutOfRange(index));
    }
    let mut next = skills.clone();
    next.remove(index);
    Ok(with_data(block, BlockData::Skills(next)))
}

fn with_data(block: &Block, data: BlockData) -> Block {
    Block {
        id: block.id,
        collapsed: block.collapsed,
        data,
    }
}

fn appended<T: Clone>(list: &[Entry<T>], entry: Entry<T>) -> Vec<Entry<T>> {
    let mut next = list.to_vec();
    next.push(entry);
    next
}

fn replaced<T: Clone + DeserializeOwned>(
    list: &[Entry<T>],
    entry_id: EntryId,
    fields: Value,
) -> Result<Vec<Entry<T>>, EditorError> {
    let index = list
        .iter()
        .position(|e| e.id == entry_id)
        .ok_or(EditorError::EntryNotFound(entry_id))?;
    let fields: T =
        serde_json::from_value(fields).map_err(|e| EditorError::InvalidEntry(e.to_string()))?;
    let mut next = list.to_vec();
    next[index] = Entry {
        id: entry_id,
        fields,
    };
    Ok(next)
}

fn removed<T: Clone>(list: &[Entry<T>], entry_id: EntryId) -> Result<Vec<Entry<T>>, EditorError> {
    if !list.iter().any(|e| e.id == entry_id) {
        return Err(EditorError::EntryNotFound(entry_id));
    }
    Ok(list.iter().filter(|e| e.id != entry_id).cloned().collect())
}
