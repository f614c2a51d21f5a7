use crate::activity::ActivityLogEntry;
use crate::config::LogStoreStrategy;
use crate::error::Result;
use crate::paths;
use crate::types::ProjectId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// LogStore
// ---------------------------------------------------------------------------

/// Durable record of tool runs, scoped by project.
///
/// Only runs made while a project is selected ever reach a `LogStore`;
/// sandbox runs are never persisted.
pub trait LogStore: Send + Sync {
    /// Record `entry` for `project_id`. The newest entry is listed first.
    /// Appending an entry whose id is already stored is a no-op.
    fn append(&self, project_id: &ProjectId, entry: &ActivityLogEntry) -> Result<()>;

    /// Every entry appended for `project_id`, newest first. Empty if none.
    fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<ActivityLogEntry>>;

    /// Drop everything stored for `project_id`.
    fn remove_by_project(&self, project_id: &ProjectId) -> Result<()>;
}

impl<T: LogStore + ?Sized> LogStore for Box<T> {
    fn append(&self, project_id: &ProjectId, entry: &ActivityLogEntry) -> Result<()> {
        (**self).append(project_id, entry)
    }

    fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<ActivityLogEntry>> {
        (**self).list_by_project(project_id)
    }

    fn remove_by_project(&self, project_id: &ProjectId) -> Result<()> {
        (**self).remove_by_project(project_id)
    }
}

/// Open the store selected in config.
pub fn open(strategy: LogStoreStrategy, state_dir: &Path) -> Box<dyn LogStore> {
    match strategy {
        LogStoreStrategy::LocalFile => Box::new(FileLogStore::new(state_dir)),
        LogStoreStrategy::Memory => Box::new(MemoryLogStore::new()),
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// FileLogStore
// ---------------------------------------------------------------------------

/// One JSON array per project under `<state_dir>/logs/`, named by
/// [`paths::project_log_path`].
pub struct FileLogStore {
    state_dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileLogStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn path(&self, project_id: &ProjectId) -> PathBuf {
        paths::project_log_path(&self.state_dir, project_id)
    }

    fn read(&self, project_id: &ProjectId) -> Result<Vec<ActivityLogEntry>> {
        match crate::io::read_optional(&self.path(project_id))? {
            Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(&data)?),
            _ => Ok(Vec::new()),
        }
    }
}

impl LogStore for FileLogStore {
    fn append(&self, project_id: &ProjectId, entry: &ActivityLogEntry) -> Result<()> {
        let _guard = lock(&self.write_lock);
        let mut entries = self.read(project_id)?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Ok(());
        }
        entries.insert(0, entry.clone());
        let data = serde_json::to_vec_pretty(&entries)?;
        crate::io::atomic_write(&self.path(project_id), &data)
    }

    fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<ActivityLogEntry>> {
        self.read(project_id)
    }

    fn remove_by_project(&self, project_id: &ProjectId) -> Result<()> {
        let _guard = lock(&self.write_lock);
        crate::io::remove_if_exists(&self.path(project_id))
    }
}

// ---------------------------------------------------------------------------
// MemoryLogStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryLogStore {
    entries: Mutex<HashMap<ProjectId, Vec<ActivityLogEntry>>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entries across all projects.
    pub fn len(&self) -> usize {
        lock(&self.entries).values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogStore for MemoryLogStore {
    fn append(&self, project_id: &ProjectId, entry: &ActivityLogEntry) -> Result<()> {
        let mut map = lock(&self.entries);
        let list = map.entry(project_id.clone()).or_default();
        if !list.iter().any(|e| e.id == entry.id) {
            list.insert(0, entry.clone());
        }
        Ok(())
    }

    fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<ActivityLogEntry>> {
        Ok(lock(&self.entries)
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    fn remove_by_project(&self, project_id: &ProjectId) -> Result<()> {
        lock(&self.entries).remove(project_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
