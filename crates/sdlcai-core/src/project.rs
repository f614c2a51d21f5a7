use crate::error::{Result, SdlcaiError};
use crate::types::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::timestamp::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "crate::timestamp::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// `updated_at`, falling back to `created_at` when the server omitted it.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// Sort newest-first by id. Server ids are monotonic, so this is creation
/// order reversed.
pub fn sort_newest_first(projects: &mut [Project]) {
    projects.sort_by(|a, b| b.id.cmp(&a.id));
}

// ---------------------------------------------------------------------------
// NewProject
// ---------------------------------------------------------------------------

/// Validated body for `POST /projects/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewProject {
    /// Trims both fields. An empty name is rejected; an empty description is
    /// dropped so it never reaches the wire.
    pub fn new(name: &str, description: Option<&str>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SdlcaiError::Validation("project name is required".into()));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            name: name.to_string(),
            description,
        })
    }
}

// ---------------------------------------------------------------------------
// ProjectStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastActiveLabel {
    Created,
    Updated,
}

impl std::fmt::Display for LastActiveLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LastActiveLabel::Created => f.write_str("Created"),
            LastActiveLabel::Updated => f.write_str("Updated"),
        }
    }
}

/// Per-project summary derived from the activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub activity_count: usize,
    pub unique_tools: usize,
    pub last_active: Option<DateTime<Utc>>,
    pub last_active_label: LastActiveLabel,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
