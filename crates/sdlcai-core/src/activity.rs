use crate::project::{LastActiveLabel, Project, ProjectStats};
use crate::types::{ProjectId, ToolId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Tool label used for server history rows that do not name a tool.
pub const DEFAULT_TOOL_LABEL: &str = "System Action";
pub const DEFAULT_TOOL_ID: &str = "system";

// ---------------------------------------------------------------------------
// ActivityLogEntry
// ---------------------------------------------------------------------------

/// One recorded tool invocation. `project_name` is captured when the entry is
/// written and is not updated if the project is later renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: String,
    pub project_id: ProjectId,
    pub project_name: String,
    pub tool_id: String,
    pub tool: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    /// Build a fresh entry for a tool run against `project`.
    pub fn record(
        project: &Project,
        tool_id: ToolId,
        tool: impl Into<String>,
        input: Value,
        output: Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            tool_id: tool_id.as_str().to_string(),
            tool: tool.into(),
            input,
            output,
            created_at: Utc::now(),
        }
    }

    fn key(&self) -> (&ProjectId, &str) {
        (&self.project_id, self.id.as_str())
    }
}

// ---------------------------------------------------------------------------
// Server history
// ---------------------------------------------------------------------------

/// Body of `GET /projects/{id}/history`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub activity_log: Vec<RawLogEntry>,
}

/// A history row as the server sends it. Every field is optional; see
/// [`RawLogEntry::normalize`] for the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct RawLogEntry {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub tool_id: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub output: Option<Value>,
}

impl RawLogEntry {
    /// Stamp the row with its owning project and fill in missing fields.
    /// `index` is the row's position in the server response and stands in
    /// for an id when the server did not send one.
    pub fn normalize(self, project: &Project, index: usize, now: DateTime<Utc>) -> ActivityLogEntry {
        let id = match self.id {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => format!("{}-{}", project.id, index),
        };
        let created_at = self
            .timestamp
            .as_ref()
            .and_then(crate::timestamp::parse)
            .or_else(|| self.created_at.as_ref().and_then(crate::timestamp::parse))
            .unwrap_or(now);
        ActivityLogEntry {
            id,
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            tool_id: self.tool_id.unwrap_or_else(|| DEFAULT_TOOL_ID.to_string()),
            tool: self
                .tool
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TOOL_LABEL.to_string()),
            input: self.input.unwrap_or(Value::Null),
            output: self.output.unwrap_or(Value::Null),
            created_at,
        }
    }
}

impl HistoryResponse {
    pub fn into_entries(self, project: &Project) -> Vec<ActivityLogEntry> {
        let now = Utc::now();
        self.activity_log
            .into_iter()
            .enumerate()
            .map(|(i, raw)| raw.normalize(project, i, now))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Feed operations
// ---------------------------------------------------------------------------

/// Flatten per-project histories into one feed: duplicates (same project and
/// entry id) keep their first occurrence, then a stable sort puts the newest
/// entries first. Ties keep their flattened order.
pub fn build_feed<I>(histories: I) -> Vec<ActivityLogEntry>
where
    I: IntoIterator<Item = Vec<ActivityLogEntry>>,
{
    let mut feed: Vec<ActivityLogEntry> = Vec::new();
    {
        let mut seen: HashSet<(ProjectId, String)> = HashSet::new();
        for entry in histories.into_iter().flatten() {
            if seen.insert((entry.project_id.clone(), entry.id.clone())) {
                feed.push(entry);
            }
        }
    }
    feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    feed
}

/// Insert `entry` keeping the feed in descending `created_at` order. An entry
/// is placed ahead of existing entries with the same timestamp. Returns false
/// (and leaves the feed alone) if the entry is already present.
pub fn insert_entry(feed: &mut Vec<ActivityLogEntry>, entry: ActivityLogEntry) -> bool {
    if feed.iter().any(|e| e.key() == entry.key()) {
        return false;
    }
    let pos = feed.partition_point(|e| e.created_at > entry.created_at);
    feed.insert(pos, entry);
    true
}

/// Entries belonging to `project_id`, in feed order.
pub fn entries_for<'a>(
    feed: &'a [ActivityLogEntry],
    project_id: &ProjectId,
) -> impl Iterator<Item = &'a ActivityLogEntry> + 'a {
    let project_id = project_id.clone();
    feed.iter().filter(move |e| e.project_id == project_id)
}

/// Summarize one project's activity. `feed` must be newest-first.
pub fn project_stats(project: &Project, feed: &[ActivityLogEntry]) -> ProjectStats {
    let mut count = 0usize;
    let mut tools: HashSet<&str> = HashSet::new();
    let mut newest: Option<DateTime<Utc>> = None;
    for entry in entries_for(feed, &project.id) {
        count += 1;
        tools.insert(entry.tool_id.as_str());
        if newest.is_none() {
            newest = Some(entry.created_at);
        }
    }

    let (last_active, label) = match (newest, project.created_at) {
        (Some(n), Some(c)) if n > c => (Some(n), LastActiveLabel::Updated),
        (Some(n), None) => (Some(n), LastActiveLabel::Updated),
        (_, created) => (created, LastActiveLabel::Created),
    };

    ProjectStats {
        activity_count: count,
        unique_tools: tools.len(),
        last_active,
        last_active_label: label,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
