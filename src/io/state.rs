use serde::{Deserialize, Serialize};

use crate::model::filter::FilterSet;
use crate::model::view::FolderView;

/// Persisted view selection (stored under the `ui` key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UiState {
    /// Selected folder name, or `All`
    #[serde(default)]
    pub view: FolderView,
    /// Active filter tokens in toggle order
    #[serde(default)]
    pub filters: FilterSet,
}
