use serde::{Deserialize, Serialize};

use super::task::TaskId;

pub type FolderId = u64;

/// A named grouping of task ids. Folders organize tasks; they do not own the
/// task records themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// Member task ids in insertion order
    #[serde(default)]
    pub tasks: Vec<TaskId>,
}

impl Folder {
    pub fn new(id: FolderId, name: impl Into<String>) -> Self {
        Folder {
            id,
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.tasks.contains(&task_id)
    }

    /// Drop every membership entry for `task_id`. Returns true if any were removed.
    pub fn detach(&mut self, task_id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|id| *id != task_id);
        self.tasks.len() != before
    }
}
