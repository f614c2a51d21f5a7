//! Project and activity-feed store.
//!
//! [`ProjectStore`] is the single owner of the project list, the global
//! activity feed and the selected project. Consumers read snapshots through
//! [`ProjectStore::state`] or a [`ProjectStore::subscribe`] receiver; every
//! change goes through one of the operations below.
//!
//! ```text
//! refresh()  ──▶ list_projects ──▶ per project, concurrently:
//!                                    project_history (remote)
//!                                    list_by_project (log store)
//!                                 ──▶ flatten, dedupe, sort newest first
//!                                 ──▶ replay journaled local ops ──▶ publish
//! ```
//!
//! Every refresh takes a generation number. A refresh whose generation is
//! no longer the latest when its fetches settle is discarded, so a slow
//! refresh can never overwrite the result of a newer one. Local mutations
//! applied while a refresh is in flight are journaled and replayed on top
//! of the refresh result.

use crate::activity::{self, ActivityLogEntry};
use crate::api::ProjectApi;
use crate::error::{Result, SdlcaiError};
use crate::log_store::LogStore;
use crate::project::{self, NewProject, Project, ProjectStats};
use crate::selection::SelectionStore;
use crate::types::{ProjectId, ToolId};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// StoreState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// Immutable snapshot of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreState {
    pub status: LoadStatus,
    /// Newest first.
    pub projects: Vec<Project>,
    /// Every known entry across all projects, newest first.
    pub activity_feed: Vec<ActivityLogEntry>,
    /// `None` is sandbox mode: tool runs are not recorded.
    pub selected_project: Option<Project>,
    /// Message of the last failed project-list load, cleared by the next
    /// successful refresh.
    pub last_error: Option<String>,
}

impl StoreState {
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.id == id)
    }

    /// Resolve a user-typed id against the loaded projects by its displayed
    /// form, so `"7"` finds both `Int(7)` and `Text("7")`. An exact integer
    /// match wins over a string id with the same text.
    pub fn find_project(&self, arg: &str) -> Option<&Project> {
        let arg = arg.trim();
        let mut found = self.projects.iter().filter(|p| p.id.to_string() == arg);
        let first = found.next()?;
        if matches!(first.id, ProjectId::Int(_)) {
            return Some(first);
        }
        Some(
            found
                .find(|p| matches!(p.id, ProjectId::Int(_)))
                .unwrap_or(first),
        )
    }

    /// One project's entries, newest first.
    pub fn project_logs(&self, id: &ProjectId) -> Vec<&ActivityLogEntry> {
        activity::entries_for(&self.activity_feed, id).collect()
    }

    pub fn project_stats(&self, id: &ProjectId) -> Option<ProjectStats> {
        self.project(id)
            .map(|p| activity::project_stats(p, &self.activity_feed))
    }

    /// Projects whose name contains `term`, ignoring case.
    pub fn search_projects(&self, term: &str) -> Vec<&Project> {
        let needle = term.trim().to_lowercase();
        self.projects
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn is_sandbox(&self) -> bool {
        self.selected_project.is_none()
    }

    pub fn is_selected(&self, id: &ProjectId) -> bool {
        self.selected_project.as_ref().is_some_and(|p| &p.id == id)
    }
}

// ---------------------------------------------------------------------------
// RefreshOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The refresh result was published.
    Applied(RefreshReport),
    /// A newer refresh started before this one finished; its result was
    /// dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefreshReport {
    pub project_count: usize,
    pub entry_count: usize,
    /// Projects whose remote history could not be fetched. Their feed
    /// contribution is whatever the local log store holds.
    pub failed_histories: Vec<ProjectId>,
}

// ---------------------------------------------------------------------------
// Local mutations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum LocalOp {
    Added(Project),
    Removed(ProjectId),
    Logged(ActivityLogEntry),
}

fn apply_op(state: &mut StoreState, op: LocalOp) {
    match op {
        LocalOp::Added(project) => {
            if state.project(&project.id).is_none() {
                state.projects.insert(0, project);
            }
        }
        LocalOp::Removed(id) => {
            state.projects.retain(|p| p.id != id);
            state.activity_feed.retain(|e| e.project_id != id);
            if state.is_selected(&id) {
                state.selected_project = None;
            }
        }
        LocalOp::Logged(entry) => {
            // Entries for projects that are gone are dropped.
            if state.project(&entry.project_id).is_some() {
                activity::insert_entry(&mut state.activity_feed, entry);
            }
        }
    }
}

struct Inner {
    state: StoreState,
    /// Generation of the most recently started refresh.
    generation: u64,
    /// Local ops applied since the latest refresh started.
    journal: Vec<LocalOp>,
    /// Whether the durable selection has been consulted yet.
    restored: bool,
    /// Projects deleted through this store. A log write that lands after its
    /// project's purge is undone against this set.
    removed: HashSet<ProjectId>,
}

// ---------------------------------------------------------------------------
// ProjectStore
// ---------------------------------------------------------------------------

pub struct ProjectStore<A, L> {
    api: A,
    logs: L,
    selection: SelectionStore,
    inner: Mutex<Inner>,
    tx: watch::Sender<StoreState>,
}

impl<A: ProjectApi, L: LogStore> ProjectStore<A, L> {
    pub fn new(api: A, logs: L, selection: SelectionStore) -> Self {
        let (tx, _rx) = watch::channel(StoreState::default());
        Self {
            api,
            logs,
            selection,
            inner: Mutex::new(Inner {
                state: StoreState::default(),
                generation: 0,
                journal: Vec::new(),
                restored: false,
                removed: HashSet::new(),
            }),
            tx,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn log_store(&self) -> &L {
        &self.logs
    }

    /// Current snapshot.
    pub fn state(&self) -> StoreState {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, inner: &Inner) {
        self.tx.send_replace(inner.state.clone());
    }

    /// Apply a local op and publish. Journaled while a refresh is in flight.
    fn commit(&self, op: LocalOp) {
        let mut inner = self.lock();
        if inner.state.status == LoadStatus::Loading {
            inner.journal.push(op.clone());
        }
        apply_op(&mut inner.state, op);
        self.publish(&inner);
    }

    // -----------------------------------------------------------------------
    // refresh
    // -----------------------------------------------------------------------

    /// Reload projects and every project's history, then replace `projects`
    /// and `activity_feed` together.
    ///
    /// A failed project-list load empties both collections and returns the
    /// error. A failed history fetch only drops that project's remote
    /// entries.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.journal.clear();
            inner.state.status = LoadStatus::Loading;
            self.publish(&inner);
            inner.generation
        };
        debug!(generation, "refresh started");

        let mut projects = match self.api.list_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                let mut inner = self.lock();
                if inner.generation == generation {
                    warn!(error = %e, "project list load failed");
                    inner.journal.clear();
                    inner.state = StoreState {
                        status: LoadStatus::Ready,
                        last_error: Some(e.to_string()),
                        ..StoreState::default()
                    };
                    // Keep the durable pointer; the next good load restores it.
                    inner.restored = false;
                    self.publish(&inner);
                }
                return Err(e);
            }
        };
        project::sort_newest_first(&mut projects);

        let results = join_all(projects.iter().map(|p| self.collect_history(p))).await;
        let mut failed_histories = Vec::new();
        let mut histories = Vec::with_capacity(results.len());
        for (project, (entries, ok)) in projects.iter().zip(results) {
            if !ok {
                failed_histories.push(project.id.clone());
            }
            histories.push(entries);
        }
        let feed = activity::build_feed(histories);

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(
                generation,
                latest = inner.generation,
                "discarding superseded refresh"
            );
            return Ok(RefreshOutcome::Superseded);
        }

        let mut next = StoreState {
            status: LoadStatus::Ready,
            projects,
            activity_feed: feed,
            selected_project: inner.state.selected_project.clone(),
            last_error: None,
        };
        for op in std::mem::take(&mut inner.journal) {
            apply_op(&mut next, op);
        }
        self.reconcile_selection(&mut inner, &mut next);

        let report = RefreshReport {
            project_count: next.projects.len(),
            entry_count: next.activity_feed.len(),
            failed_histories,
        };
        info!(
            generation,
            projects = report.project_count,
            entries = report.entry_count,
            failed = report.failed_histories.len(),
            "refresh applied"
        );
        inner.state = next;
        self.publish(&inner);
        Ok(RefreshOutcome::Applied(report))
    }

    /// Remote history plus locally stored entries for one project. The flag
    /// is false when the remote fetch failed.
    async fn collect_history(&self, project: &Project) -> (Vec<ActivityLogEntry>, bool) {
        let (mut entries, ok) = match self.api.project_history(project).await {
            Ok(entries) => (entries, true),
            Err(e) => {
                warn!(project_id = %project.id, error = %e, "history fetch failed, treating as empty");
                (Vec::new(), false)
            }
        };
        match self.logs.list_by_project(&project.id) {
            Ok(local) => entries.extend(local),
            Err(e) => {
                warn!(project_id = %project.id, error = %e, "local log read failed, skipping")
            }
        }
        (entries, ok)
    }

    /// Restore the durable selection on the first good load, and drop a
    /// selection whose project has disappeared.
    fn reconcile_selection(&self, inner: &mut Inner, next: &mut StoreState) {
        if !inner.restored {
            inner.restored = true;
            if next.selected_project.is_none() {
                if let Some(id) = self.selection.load() {
                    match next.project(&id).cloned() {
                        Some(project) => {
                            debug!(project_id = %id, "restored selected project");
                            next.selected_project = Some(project);
                        }
                        None => {
                            warn!(project_id = %id, "stored selection matches no project, clearing");
                            self.clear_pointer();
                        }
                    }
                }
            }
        }

        if let Some(selected) = next.selected_project.take() {
            match next.project(&selected.id).cloned() {
                Some(current) => next.selected_project = Some(current),
                None => {
                    info!(project_id = %selected.id, "selected project no longer exists");
                    self.clear_pointer();
                }
            }
        }
    }

    fn clear_pointer(&self) {
        if let Err(e) = self.selection.clear() {
            warn!(error = %e, "failed to clear stored selection");
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a project and put it at the top of the list. No feed entry is
    /// written for the creation.
    pub async fn add_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        let new = NewProject::new(name, description)?;
        let project = self.api.create_project(&new).await?;
        info!(project_id = %project.id, name = %project.name, "project created");
        self.commit(LocalOp::Added(project.clone()));
        Ok(project)
    }

    /// Delete a project remotely, then drop it, its feed entries, its local
    /// logs and (if it was selected) the selection.
    ///
    /// A failed remote delete leaves everything untouched. A failed local
    /// purge is returned after the in-memory state has been updated.
    pub async fn remove_project(&self, id: &ProjectId) -> Result<()> {
        self.api.delete_project(id).await?;
        info!(project_id = %id, "project deleted");
        self.lock().removed.insert(id.clone());

        let purge = self.logs.remove_by_project(id);
        if self.selection.load().as_ref() == Some(id) {
            self.clear_pointer();
        }
        self.commit(LocalOp::Removed(id.clone()));
        purge
    }

    /// Select a loaded project (persisting the choice) or, with `None`,
    /// return to sandbox mode. The activity feed is unaffected.
    pub fn select_project(&self, id: Option<&ProjectId>) -> Result<Option<Project>> {
        let mut inner = self.lock();
        match id {
            None => {
                self.selection.clear()?;
                inner.state.selected_project = None;
            }
            Some(id) => {
                let project = inner
                    .state
                    .project(id)
                    .cloned()
                    .ok_or_else(|| SdlcaiError::ProjectNotFound(id.to_string()))?;
                self.selection.save(id)?;
                inner.state.selected_project = Some(project);
            }
        }
        inner.restored = true;
        self.publish(&inner);
        Ok(inner.state.selected_project.clone())
    }

    /// Record a completed tool run against the selected project.
    ///
    /// In sandbox mode this returns `Ok(None)` and writes nothing. Otherwise
    /// the entry is persisted, then placed in the feed immediately. An empty
    /// `tool_name` falls back to the tool's display name. If the project is
    /// removed while the entry is being written, the write is purged and
    /// `Ok(None)` is returned.
    pub fn log_activity(
        &self,
        tool_id: ToolId,
        tool_name: &str,
        input: Value,
        output: Value,
    ) -> Result<Option<ActivityLogEntry>> {
        let selected = self.lock().state.selected_project.clone();
        let Some(project) = selected else {
            debug!(tool = %tool_id, "sandbox mode, activity not recorded");
            return Ok(None);
        };

        let tool_name = if tool_name.trim().is_empty() {
            tool_id.display_name()
        } else {
            tool_name
        };
        let entry = ActivityLogEntry::record(&project, tool_id, tool_name, input, output);
        self.logs.append(&project.id, &entry)?;
        if self.lock().removed.contains(&project.id) {
            debug!(project_id = %project.id, "project removed during log write, discarding entry");
            self.logs.remove_by_project(&project.id)?;
            return Ok(None);
        }
        debug!(project_id = %project.id, tool = %tool_id, entry_id = %entry.id, "activity recorded");
        self.commit(LocalOp::Logged(entry.clone()));
        Ok(Some(entry))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
