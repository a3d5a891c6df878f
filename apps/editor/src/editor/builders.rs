//! Pure constructors for blocks, entries and the seeded document.

use uuid::Uuid;

use crate::editor::blocks::{
    Block, BlockData, BlockType, Document, EducationEntry, Entry, ExperienceEntry, PersonalInfo,
    ProjectEntry, SummaryText,
};
use crate::editor::EditorError;
use crate::models::profile::{EducationItem, ExperienceItem, ProfileSnapshot, ProjectItem};

/// A freshly created list entry, typed by the block it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewEntry {
    Experience(ExperienceEntry),
    Education(EducationEntry),
    Project(ProjectEntry),
}

impl NewEntry {
    pub fn id(&self) -> Uuid {
        match self {
            NewEntry::Experience(e) => e.id,
            NewEntry::Education(e) => e.id,
            NewEntry::Project(e) => e.id,
        }
    }
}

pub fn build_empty_block(block_type: BlockType) -> Block {
    let data = match block_type {
        BlockType::Personal => BlockData::Personal(PersonalInfo::default()),
        BlockType::Summary => BlockData::Summary(SummaryText::default()),
        BlockType::Experience => BlockData::Experience(Vec::new()),
        BlockType::Education => BlockData::Education(Vec::new()),
        BlockType::Projects => BlockData::Projects(Vec::new()),
        BlockType::Skills => BlockData::Skills(Vec::new()),
    };
    Block {
        id: Uuid::new_v4(),
        collapsed: false,
        data,
    }
}

/// Blank entry for a list-type block. Personal, Summary and Skills hold no
/// entries and are rejected.
pub fn build_empty_entry(block_type: BlockType) -> Result<NewEntry, EditorError> {
    match block_type {
        BlockType::Experience => Ok(NewEntry::Experience(Entry::new(ExperienceItem::default()))),
        BlockType::Education => Ok(NewEntry::Education(Entry::new(EducationItem::default()))),
        BlockType::Projects => Ok(NewEntry::Project(Entry::new(ProjectItem::default()))),
        other => Err(EditorError::NotAListBlock(other)),
    }
}

/// Seeds the six canonical blocks from a profile, in render order, with
/// fresh ids on every block and entry.
pub fn build_initial_blocks(profile: &ProfileSnapshot) -> Document {
    let blocks = BlockType::ALL
        .into_iter()
        .map(|block_type| {
            let data = match block_type {
                BlockType::Personal => BlockData::Personal(PersonalInfo {
                    name: profile.name.clone(),
                    email: profile.email.clone(),
                    phone: profile.phone.clone(),
                    linkedin: profile.linkedin.clone(),
                    github: profile.github.clone(),
                    website: profile.website.clone(),
                }),
                BlockType::Summary => BlockData::Summary(SummaryText {
                    text: profile.summary.clone(),
                }),
                BlockType::Experience => BlockData::Experience(
                    profile.experience.iter().cloned().map(Entry::new).collect(),
                ),
                BlockType::Education => BlockData::Education(
                    profile.education.iter().cloned().map(Entry::new).collect(),
                ),
                BlockType::Projects => BlockData::Projects(
                    profile.projects.iter().cloned().map(Entry::new).collect(),
                ),
                BlockType::Skills => BlockData::Skills(profile.skills.clone()),
            };
            Block {
                id: Uuid::new_v4(),
                collapsed: false,
                data,
            }
        })
        .collect();
    Document::new(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_profile() -> ProfileSnapshot {
        ProfileSnapshot {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            summary: "Analyst".to_string(),
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            experience: vec![
                ExperienceItem {
                    title: "Engineer".to_string(),
                    ..Default::default()
                },
                ExperienceItem {
                    title: "Intern".to_string(),
                    ..Default::default()
                },
            ],
            projects: vec![ProjectItem {
                name: "Engine".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_blocks_have_blank_payloads() {
        let personal = build_empty_block(BlockType::Personal);
        assert_eq!(personal.data, BlockData::Personal(PersonalInfo::default()));
        assert!(!personal.collapsed);

        let summary = build_empty_block(BlockType::Summary);
        assert_eq!(summary.data, BlockData::Summary(SummaryText::default()));

        assert_eq!(
            build_empty_block(BlockType::Skills).data,
            BlockData::Skills(vec![])
        );
        assert_eq!(
            build_empty_block(BlockType::Projects).data,
            BlockData::Projects(vec![])
        );
    }

    #[test]
    fn test_empty_blocks_get_distinct_ids() {
        let a = build_empty_block(BlockType::Skills);
        let b = build_empty_block(BlockType::Skills);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_empty_entry_matches_block_type() {
        assert_matches!(
            build_empty_entry(BlockType::Education),
            Ok(NewEntry::Education(e)) if e.fields == EducationItem::default()
        );
        assert_matches!(
            build_empty_entry(BlockType::Skills),
            Err(EditorError::NotAListBlock(BlockType::Skills))
        );
    }

    #[test]
    fn test_initial_blocks_are_canonical_order() {
        let doc = build_initial_blocks(&sample_profile());
        let types: Vec<_> = doc.iter().map(|b| b.block_type()).collect();
        assert_eq!(types, BlockType::ALL.to_vec());
        assert!(doc.ids_are_unique());
    }

    #[test]
    fn test_initial_blocks_copy_profile_values() {
        let doc = build_initial_blocks(&sample_profile());
        assert_matches!(&doc.blocks()[0].data, BlockData::Personal(p) if p.name == "Ada Lovelace");
        assert_matches!(&doc.blocks()[1].data, BlockData::Summary(s) if s.text == "Analyst");
        assert_matches!(&doc.blocks()[2].data, BlockData::Experience(entries) => {
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[1].fields.title, "Intern");
            assert_ne!(entries[0].id, entries[1].id);
        });
        assert_matches!(&doc.blocks()[5].data, BlockData::Skills(s) if s.len() == 2);
    }

    #[test]
    fn test_initial_blocks_from_empty_profile() {
        let doc = build_initial_blocks(&ProfileSnapshot::default());
        assert_eq!(doc.len(), 6);
        assert_matches!(&doc.blocks()[2].data, BlockData::Experience(e) if e.is_empty());
    }
}
