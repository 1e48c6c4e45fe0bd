use serde::{Deserialize, Serialize};

/// Task ids are unique among tasks; folder membership refers to them.
pub type TaskId = u64;

/// Task checkbox state.
///
/// Persisted as a plain boolean (`false` = to do, `true` = done).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum TaskState {
    #[default]
    Todo,
    Done,
}

impl TaskState {
    /// The character used inside the checkbox `[ ]`
    pub fn checkbox_char(self) -> char {
        match self {
            TaskState::Todo => ' ',
            TaskState::Done => 'x',
        }
    }

    pub fn toggled(self) -> TaskState {
        match self {
            TaskState::Todo => TaskState::Done,
            TaskState::Done => TaskState::Todo,
        }
    }

    pub fn is_done(self) -> bool {
        self == TaskState::Done
    }
}

impl From<bool> for TaskState {
    fn from(done: bool) -> Self {
        if done { TaskState::Done } else { TaskState::Todo }
    }
}

impl From<TaskState> for bool {
    fn from(state: TaskState) -> Self {
        state.is_done()
    }
}

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Free text as typed; may be empty
    pub description: String,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub state: TaskState,
    /// Reserved timestamp. Kept as the stored text so any format survives
    /// a load/save cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Task {
    /// Create a new pending task
    pub fn new(id: TaskId, description: impl Into<String>, starred: bool) -> Self {
        Task {
            id,
            description: description.into(),
            starred,
            state: TaskState::Todo,
            date: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Copy of this task with the checkbox flipped
    pub fn with_state_toggled(&self) -> Task {
        Task {
            state: self.state.toggled(),
            ..self.clone()
        }
    }

    /// Copy of this task with the star flipped
    pub fn with_star_toggled(&self) -> Task {
        Task {
            starred: !self.starred,
            ..self.clone()
        }
    }
}
