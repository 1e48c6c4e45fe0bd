//! The task store: the single owner of tasks, folders, the folder view and
//! the filter set.
//!
//! Every state-affecting operation writes the affected collections back to
//! the [`KvStore`] it wraps. Writes are fire-and-forget: a failed write is
//! logged (and its payload stashed in the recovery log when one is
//! configured) but the in-memory change stands.
//!
//! Operations addressing an unknown task or folder id are no-ops that return
//! `None` and write nothing.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::io::codec::{self, FOLDERS_KEY, TASKS_KEY, UI_KEY};
use crate::io::kv::KvStore;
use crate::io::recovery::{self, RecoveryEntry};
use crate::io::state::UiState;
use crate::model::filter::{FilterSet, FilterToken};
use crate::model::folder::{Folder, FolderId};
use crate::model::task::{Task, TaskId};
use crate::model::view::FolderView;

/// Error type for store operations that validate their input
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("folder not found: {0}")]
    UnknownFolder(String),
}

/// Input for [`Store::add_task`]
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub description: String,
    pub starred: bool,
    /// Folder to file the task under; `All` files it nowhere
    pub folder: FolderView,
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        NewTask {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn starred(mut self, starred: bool) -> Self {
        self.starred = starred;
        self
    }

    pub fn in_folder(mut self, folder: FolderView) -> Self {
        self.folder = folder;
        self
    }
}

/// Monotonic id high-water marks. Seeded from the largest loaded id and
/// never lowered, so a freed id is not handed out again within a session.
#[derive(Debug, Default, Clone, Copy)]
struct IdMarks {
    task: TaskId,
    folder: FolderId,
}

impl IdMarks {
    fn next_task(&mut self, tasks: &[Task]) -> TaskId {
        next_id(&mut self.task, tasks.iter().map(|t| t.id), "task")
    }

    fn next_folder(&mut self, folders: &[Folder]) -> FolderId {
        next_id(&mut self.folder, folders.iter().map(|f| f.id), "folder")
    }
}

/// Bump `mark` and return it. Once the mark is at `u64::MAX` the smallest id
/// not in `taken` is handed out instead and the mark stays put.
fn next_id(mark: &mut u64, taken: impl Iterator<Item = u64>, kind: &str) -> u64 {
    if let Some(next) = mark.checked_add(1) {
        *mark = next;
        return next;
    }
    let taken: HashSet<u64> = taken.collect();
    let id = (1..=u64::MAX).find(|id| !taken.contains(id)).unwrap_or(0);
    warn!(kind, id, "id space exhausted; reusing the smallest free id");
    id
}

pub struct Store<S: KvStore> {
    backend: S,
    tasks: Vec<Task>,
    folders: Vec<Folder>,
    ui: UiState,
    ids: IdMarks,
    ready: bool,
    pretty: bool,
    recovery_dir: Option<PathBuf>,
}

impl<S: KvStore> Store<S> {
    /// An empty, not-yet-loaded store. Writes are suppressed until
    /// [`Store::load`] has run.
    pub fn new(backend: S) -> Self {
        Store {
            backend,
            tasks: Vec::new(),
            folders: Vec::new(),
            ui: UiState::default(),
            ids: IdMarks::default(),
            ready: false,
            pretty: false,
            recovery_dir: None,
        }
    }

    /// Create and load in one step.
    pub fn open(backend: S) -> Self {
        let mut store = Store::new(backend);
        store.load();
        store
    }

    /// Indent stored JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Stash unreadable or unsaved payloads in the recovery log under `dir`.
    pub fn with_recovery_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.recovery_dir = Some(dir.into());
        self
    }

    // -----------------------------------------------------------------------
    // Startup
    // -----------------------------------------------------------------------

    /// Read tasks, folders and view state from the backend, then mark the
    /// store ready. Absent or unreadable entries load as empty/defaults.
    pub fn load(&mut self) {
        self.tasks = self.read_key::<Vec<Task>>(TASKS_KEY).unwrap_or_default();
        self.folders = self.read_key::<Vec<Folder>>(FOLDERS_KEY).unwrap_or_default();
        self.ui = self.read_key::<UiState>(UI_KEY).unwrap_or_default();

        self.repair_memberships();
        if !self.view_exists(&self.ui.view) {
            warn!(view = %self.ui.view, "stored view names a missing folder; showing All");
            self.ui.view = FolderView::All;
        }

        self.ids = IdMarks {
            task: self.tasks.iter().map(|t| t.id).max().unwrap_or(0),
            folder: self.folders.iter().map(|f| f.id).max().unwrap_or(0),
        };
        self.ready = true;
        debug!(
            tasks = self.tasks.len(),
            folders = self.folders.len(),
            "store loaded"
        );
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Drop folder entries pointing at tasks that do not exist.
    fn repair_memberships(&mut self) {
        let tasks = &self.tasks;
        for folder in &mut self.folders {
            let before = folder.tasks.len();
            folder
                .tasks
                .retain(|id| tasks.iter().any(|t| t.id == *id));
            if folder.tasks.len() != before {
                warn!(
                    folder = %folder.name,
                    dropped = before - folder.tasks.len(),
                    "folder listed missing tasks"
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// All tasks, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn active_view(&self) -> &FolderView {
        &self.ui.view
    }

    pub fn filters(&self) -> &FilterSet {
        &self.ui.filters
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    /// First folder with this name
    pub fn folder_by_name(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// First folder listing this task
    pub fn folder_of(&self, task_id: TaskId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.contains(task_id))
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    fn view_exists(&self, view: &FolderView) -> bool {
        match view {
            FolderView::All => true,
            FolderView::Folder(name) => self.folder_by_name(name).is_some(),
        }
    }

    // -----------------------------------------------------------------------
    // Task operations
    // -----------------------------------------------------------------------

    /// Create a pending task at the front of the list.
    ///
    /// When a folder is named, the task joins it and that folder moves to the
    /// front of the folder list. An unknown folder name leaves the task
    /// unfiled. The view always ends on `All`.
    pub fn add_task(&mut self, new: NewTask) -> Task {
        let task = Task::new(self.ids.next_task(&self.tasks), new.description, new.starred);

        if let FolderView::Folder(name) = &new.folder {
            match self.folders.iter().position(|f| &f.name == name) {
                Some(idx) => {
                    let mut folder = self.folders.remove(idx);
                    folder.tasks.push(task.id);
                    self.folders.insert(0, folder);
                }
                None => warn!(folder = %name, task = task.id, "no such folder; task left unfiled"),
            }
        }

        self.tasks.insert(0, task.clone());
        debug!(id = task.id, starred = task.starred, folder = %new.folder, "task added");

        self.save_collections();
        self.set_view_and_save(FolderView::All);
        task
    }

    /// Remove a task and every folder membership pointing at it.
    pub fn delete_task(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(idx);
        for folder in &mut self.folders {
            folder.detach(id);
        }
        debug!(id, "task deleted");
        self.save_collections();
        Some(removed)
    }

    /// Flip done/to-do. Returns the updated task.
    pub fn toggle_task_state(&mut self, id: TaskId) -> Option<Task> {
        let updated = self.replace_task(id, Task::with_state_toggled)?;
        debug!(id, done = updated.is_done(), "task state toggled");
        self.save_collections();
        Some(updated)
    }

    /// Flip the star. Returns the updated task.
    pub fn toggle_task_starred(&mut self, id: TaskId) -> Option<Task> {
        let updated = self.replace_task(id, Task::with_star_toggled)?;
        debug!(id, starred = updated.starred, "task star toggled");
        self.save_collections();
        Some(updated)
    }

    /// Swap the stored record for a fresh copy produced by `f`.
    fn replace_task(&mut self, id: TaskId, f: impl FnOnce(&Task) -> Task) -> Option<Task> {
        let slot = self.tasks.iter_mut().find(|t| t.id == id)?;
        let updated = f(slot);
        *slot = updated.clone();
        Some(updated)
    }

    // -----------------------------------------------------------------------
    // Folder operations
    // -----------------------------------------------------------------------

    /// Create an empty folder at the front of the folder list.
    pub fn add_folder(&mut self, name: impl Into<String>) -> Folder {
        let folder = Folder::new(self.ids.next_folder(&self.folders), name);
        self.folders.insert(0, folder.clone());
        debug!(id = folder.id, name = %folder.name, "folder added");
        self.save_collections();
        folder
    }

    /// Delete a folder together with the tasks it lists.
    ///
    /// The view is reset to `All` even when `id` matches nothing.
    pub fn delete_folder(&mut self, id: FolderId) -> Option<Folder> {
        self.set_view_and_save(FolderView::All);

        let idx = self.folders.iter().position(|f| f.id == id)?;
        let removed = self.folders.remove(idx);

        let before = self.tasks.len();
        self.tasks.retain(|t| !removed.contains(t.id));
        for other in &mut self.folders {
            other.tasks.retain(|tid| !removed.contains(*tid));
        }

        debug!(
            id,
            name = %removed.name,
            tasks_removed = before - self.tasks.len(),
            "folder deleted"
        );
        self.save_collections();
        Some(removed)
    }

    // -----------------------------------------------------------------------
    // View and filters
    // -----------------------------------------------------------------------

    /// Scope the task list to a folder (or `All`).
    pub fn set_active_folder_view(&mut self, view: FolderView) -> Result<(), StoreError> {
        if !self.view_exists(&view) {
            return Err(StoreError::UnknownFolder(view.name().to_string()));
        }
        self.set_view_and_save(view);
        Ok(())
    }

    /// Toggle a filter token; see [`FilterSet::toggle`] for the rules.
    pub fn toggle_filter(&mut self, token: FilterToken) -> &FilterSet {
        self.ui.filters.toggle(token);
        debug!(filters = %self.ui.filters, "filters toggled");
        self.save_ui();
        &self.ui.filters
    }

    /// Tasks to display for the current view and filters, in source order.
    ///
    /// With view `All` the source is the whole task list; otherwise it is the
    /// selected folder's member list in its own order.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let source: Vec<&Task> = match &self.ui.view {
            FolderView::All => self.tasks.iter().collect(),
            FolderView::Folder(name) => match self.folder_by_name(name) {
                Some(folder) => folder.tasks.iter().filter_map(|id| self.task(*id)).collect(),
                None => Vec::new(),
            },
        };
        source
            .into_iter()
            .filter(|task| self.ui.filters.admits(task))
            .collect()
    }

    fn set_view_and_save(&mut self, view: FolderView) {
        if self.ui.view != view {
            debug!(from = %self.ui.view, to = %view, "view changed");
            self.ui.view = view;
            self.save_ui();
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn save_collections(&mut self) {
        let tasks = codec::encode(&self.tasks, self.pretty);
        self.write_encoded(TASKS_KEY, tasks);
        let folders = codec::encode(&self.folders, self.pretty);
        self.write_encoded(FOLDERS_KEY, folders);
    }

    fn save_ui(&mut self) {
        let ui = codec::encode(&self.ui, self.pretty);
        self.write_encoded(UI_KEY, ui);
    }

    fn write_encoded(&mut self, key: &str, encoded: serde_json::Result<String>) {
        if !self.ready {
            debug!(key, "store not loaded yet; write suppressed");
            return;
        }
        let payload = match encoded {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "could not encode value");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &payload) {
            warn!(key, error = %e, "write failed; keeping in-memory state");
            if let Some(dir) = self.recovery_dir.as_deref() {
                recovery::log_recovery(dir, RecoveryEntry::unsaved(key, &e.to_string(), &payload));
            }
        }
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get(key)?;
        match codec::decode(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "stored value unreadable; starting empty");
                if let Some(dir) = self.recovery_dir.as_deref() {
                    recovery::log_recovery(dir, RecoveryEntry::unreadable(key, &e.to_string(), &raw));
                }
                None
            }
        }
    }
}
