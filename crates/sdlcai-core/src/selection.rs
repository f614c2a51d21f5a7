use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::paths;
use crate::types::ProjectId;

// ─── SelectionStore ───────────────────────────────────────────────────────

/// Durable pointer to the selected project, so the last selection can be
/// restored on the next start.
///
/// The id is stored as JSON in `<state_dir>/selected_project`: `7` for an
/// integer id, `"7"` for a string id. Bare text that is not JSON is read as a
/// string id.
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(state_dir: &Path) -> Self {
        SelectionStore {
            path: paths::selected_project_path(state_dir),
        }
    }

    /// Return the stored id, or `None` if nothing is stored.
    pub fn load(&self) -> Option<ProjectId> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(
            serde_json::from_str(raw)
                .unwrap_or_else(|_| ProjectId::Text(raw.to_owned())),
        )
    }

    pub fn save(&self, id: &ProjectId) -> Result<()> {
        let data = serde_json::to_string(id)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }

    /// Forget the stored id (no-op if none exists).
    pub fn clear(&self) -> Result<()> {
        crate::io::remove_if_exists(&self.path)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
