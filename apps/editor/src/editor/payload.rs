//! Document -> profile service payload.

use crate::editor::blocks::{BlockData, Document, Entry};
use crate::models::profile::FlatProfilePayload;

/// Folds the document into the flat shape `update_profile` expects.
///
/// Personal fields land at the top level, the summary text under `summary`,
/// and each list block under its own key with editor ids stripped. When a
/// type appears more than once the later block wins; types with no block
/// are left out of the payload.
pub fn flatten_document(document: &Document) -> FlatProfilePayload {
    let mut payload = FlatProfilePayload::default();

    for block in document.iter() {
        match &block.data {
            BlockData::Personal(p) => {
                payload.name = Some(p.name.clone());
                payload.email = Some(p.email.clone());
                payload.phone = Some(p.phone.clone());
                payload.linkedin = Some(p.linkedin.clone());
                payload.github = Some(p.github.clone());
                payload.website = Some(p.website.clone());
            }
            BlockData::Summary(s) => payload.summary = Some(s.text.clone()),
            BlockData::Experience(list) => payload.experience = Some(strip_ids(list)),
            BlockData::Education(list) => payload.education = Some(strip_ids(list)),
            BlockData::Projects(list) => payload.projects = Some(strip_ids(list)),
            BlockData::Skills(skills) => payload.skills = Some(skills.clone()),
        }
    }

    payload
}

fn strip_ids<T: Clone>(entries: &[Entry<T>]) -> Vec<T> {
    entries.iter().map(|e| e.fields.clone()).collect()
}
