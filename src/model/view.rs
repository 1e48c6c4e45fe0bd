use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel name for the unscoped view
pub const ALL_FOLDERS: &str = "All";

/// Which folder the task list is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FolderView {
    #[default]
    All,
    /// Scoped to the folder with this name
    Folder(String),
}

impl FolderView {
    pub fn parse(name: &str) -> FolderView {
        if name == ALL_FOLDERS {
            FolderView::All
        } else {
            FolderView::Folder(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FolderView::All => ALL_FOLDERS,
            FolderView::Folder(name) => name,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FolderView::All)
    }
}

impl From<String> for FolderView {
    fn from(name: String) -> Self {
        if name == ALL_FOLDERS {
            FolderView::All
        } else {
            FolderView::Folder(name)
        }
    }
}

impl From<FolderView> for String {
    fn from(view: FolderView) -> Self {
        match view {
            FolderView::All => ALL_FOLDERS.to_string(),
            FolderView::Folder(name) => name,
        }
    }
}

impl fmt::Display for FolderView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
