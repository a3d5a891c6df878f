//! Block-based document model.
//!
//! A [`Document`] is an ordered list of [`Block`]s; each block carries a
//! [`BlockData`] payload whose variant is the block's type. On the wire a
//! block looks like `{"id", "type", "collapsed", "data"}`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editor::EditorError;
use crate::models::profile::{EducationItem, ExperienceItem, ProjectItem};

pub type BlockId = Uuid;
pub type EntryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Personal,
    Summary,
    Experience,
    Education,
    Projects,
    Skills,
}

impl BlockType {
    /// Canonical render order used when seeding a document.
    pub const ALL: [BlockType; 6] = [
        BlockType::Personal,
        BlockType::Summary,
        BlockType::Experience,
        BlockType::Education,
        BlockType::Projects,
        BlockType::Skills,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Personal => "personal",
            BlockType::Summary => "summary",
            BlockType::Experience => "experience",
            BlockType::Education => "education",
            BlockType::Projects => "projects",
            BlockType::Skills => "skills",
        }
    }

    /// Human-readable section title.
    pub fn title(&self) -> &'static str {
        match self {
            BlockType::Personal => "Personal",
            BlockType::Summary => "Summary",
            BlockType::Experience => "Experience",
            BlockType::Education => "Education",
            BlockType::Projects => "Projects",
            BlockType::Skills => "Skills",
        }
    }

    pub fn holds_entries(&self) -> bool {
        matches!(
            self,
            BlockType::Experience | BlockType::Education | BlockType::Projects
        )
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| EditorError::InvalidBlockType(s.to_string()))
    }
}

/// Contact fields of the Personal block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryText {
    pub text: String,
}

/// A list item with an editor-local id. The id never leaves the editor;
/// `fields` is what the profile service stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub id: EntryId,
    #[serde(flatten)]
    pub fields: T,
}

impl<T> Entry<T> {
    /// Wraps `fields` with a fresh id.
    pub fn new(fields: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            fields,
        }
    }
}

pub type ExperienceEntry = Entry<ExperienceItem>;
pub type EducationEntry = Entry<EducationItem>;
pub type ProjectEntry = Entry<ProjectItem>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BlockData {
    Personal(PersonalInfo),
    Summary(SummaryText),
    Experience(Vec<ExperienceEntry>),
    Education(Vec<EducationEntry>),
    Projects(Vec<ProjectEntry>),
    Skills(Vec<String>),
}

impl BlockData {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockData::Personal(_) => BlockType::Personal,
            BlockData::Summary(_) => BlockType::Summary,
            BlockData::Experience(_) => BlockType::Experience,
            BlockData::Education(_) => BlockType::Education,
            BlockData::Projects(_) => BlockType::Projects,
            BlockData::Skills(_) => BlockType::Skills,
        }
    }

    /// Ids of every entry held by a list-type payload; empty otherwise.
    pub fn entry_ids(&self) -> Vec<EntryId> {
        match self {
            BlockData::Experience(entries) => entries.iter().map(|e| e.id).collect(),
            BlockData::Education(entries) => entries.iter().map(|e| e.id).collect(),
            BlockData::Projects(entries) => entries.iter().map(|e| e.id).collect(),
            BlockData::Personal(_) | BlockData::Summary(_) | BlockData::Skills(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(flatten)]
    pub data: BlockData,
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        self.data.block_type()
    }

    /// Returns the first entry id that appears more than once, if any.
    pub fn duplicate_entry_id(&self) -> Option<EntryId> {
        let mut seen = HashSet::new();
        self.data.entry_ids().into_iter().find(|id| !seen.insert(*id))
    }
}

/// Ordered blocks of one resume. Order is render order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// True when no two blocks share an id and no block repeats an entry id.
    pub fn ids_are_unique(&self) -> bool {
        let mut seen = HashSet::new();
        self.blocks
            .iter()
            .all(|b| seen.insert(b.id) && b.duplicate_entry_id().is_none())
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}
