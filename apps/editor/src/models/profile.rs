use serde::{Deserialize, Serialize};

/// One job as stored by the profile service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceItem {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start: String,
    pub end: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationItem {
    pub school: String,
    pub degree: String,
    pub field: String,
    pub start: String,
    pub end: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectItem {
    pub name: String,
    pub technologies: String,
    pub url: String,
    pub description: String,
}

/// The persisted profile record as returned by `get_profile`.
/// Every field is optional on the wire; absent values become empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSnapshot {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub projects: Vec<ProjectItem>,
}

/// Flattened document sent to `update_profile`.
///
/// A field is `None` when the document had no block feeding it; the profile
/// service leaves such fields untouched (partial `$set` semantics).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatProfilePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<ExperienceItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<EducationItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

impl ProfileSnapshot {
    /// Merges a payload into this snapshot the way the profile service does:
    /// present fields overwrite, absent fields are kept.
    pub fn apply(&mut self, payload: &FlatProfilePayload) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut self.name, &payload.name);
        set(&mut self.email, &payload.email);
        set(&mut self.phone, &payload.phone);
        set(&mut self.linkedin, &payload.linkedin);
        set(&mut self.github, &payload.github);
        set(&mut self.website, &payload.website);
        set(&mut self.summary, &payload.summary);
        set(&mut self.experience, &payload.experience);
        set(&mut self.education, &payload.education);
        set(&mut self.projects, &payload.projects);
        set(&mut self.skills, &payload.skills);
    }
}
