// Resume editor core: block model, snapshot history, entry helpers,
// autosave orchestration and the per-user editing session.
// Handlers only talk to `session`; nothing outside this module mutates a Document.

pub mod autosave;
pub mod blocks;
pub mod builders;
pub mod entries;
pub mod handlers;
pub mod history;
pub mod payload;
pub mod preview;
pub mod session;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

use crate::editor::blocks::BlockType;

/// Structural misuse of the block store. These are caller errors and are
/// always returned, never logged and dropped.
#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error("Invalid block type: '{0}'")]
    InvalidBlockType(String),

    #[error("Block {0} not found")]
    BlockNotFound(Uuid),

    #[error("Replacement block id {found} does not match target {expected}")]
    BlockIdMismatch { expected: Uuid, found: Uuid },

    #[error("Duplicate entry id {0} in block")]
    DuplicateEntryId(Uuid),

    #[error("Entry {0} not found")]
    EntryNotFound(Uuid),

    #[error("Block type '{0}' does not hold entries")]
    NotAListBlock(BlockType),

    #[error("Block type '{0}' does not hold skills")]
    NotASkillsBlock(BlockType),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Skill cannot be empty")]
    EmptySkill,

    #[error("Skill index {0} out of range")]
    SkillOutOfRange(usize),
}
