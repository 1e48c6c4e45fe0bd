//! Text encoding of the stored collections.
//!
//! Every stored value is JSON. Field order is irrelevant on read; on write
//! the struct declaration order is used.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key holding the task collection
pub const TASKS_KEY: &str = "tasks";
/// Key holding the folder collection
pub const FOLDERS_KEY: &str = "folders";
/// Key holding the selected view and active filters
pub const UI_KEY: &str = "ui";

/// Encode a value for storage, indented when `pretty` is set.
pub fn encode<T: Serialize + ?Sized>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

pub fn decode<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    serde_json::from_str(raw)
}
