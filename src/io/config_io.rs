use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    DocumentError(#[from] toml_edit::TomlError),
    #[error("invalid config key: {0} (expected <table>.<field>)")]
    InvalidKey(String),
    #[error("config key {0} is not a table")]
    NotATable(String),
}

/// Resolve the data directory: explicit override, then `TICKLIST_DIR`, then
/// `$XDG_DATA_HOME/ticklist`, then `$HOME/.local/share/ticklist`.
pub fn resolve_data_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var("TICKLIST_DIR") {
        return PathBuf::from(dir);
    }
    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".local").join("share"));
    data_home.join("ticklist")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for round-trip-safe editing. A missing file yields defaults and
/// an empty document.
pub fn read_config(data_dir: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let path = config_path(data_dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => return Err(ConfigError::ReadError { path, source }),
    };
    let config: Config = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(data_dir);
    fs::write(&path, doc.to_string()).map_err(|source| ConfigError::WriteError { path, source })
}

/// Look up a dotted `table.field` key in the document.
pub fn get_value(doc: &toml_edit::DocumentMut, key: &str) -> Result<Option<String>, ConfigError> {
    let (table, field) = split_key(key)?;
    Ok(doc
        .get(table)
        .and_then(|t| t.get(field))
        .and_then(|item| item.as_value())
        .map(render_value))
}

/// Set a dotted `table.field` key. Booleans and integers are stored typed,
/// anything else as a string.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, raw: &str) -> Result<(), ConfigError> {
    let (table, field) = split_key(key)?;
    match doc.get(table) {
        None => doc[table] = toml_edit::Item::Table(toml_edit::Table::new()),
        Some(item) if item.is_table_like() => {}
        Some(_) => return Err(ConfigError::NotATable(table.to_string())),
    }
    doc[table][field] = if let Ok(b) = raw.parse::<bool>() {
        toml_edit::value(b)
    } else if let Ok(n) = raw.parse::<i64>() {
        toml_edit::value(n)
    } else {
        toml_edit::value(raw)
    };
    Ok(())
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    match key.split_once('.') {
        Some((table, field)) if !table.is_empty() && !field.is_empty() && !field.contains('.') => {
            Ok((table, field))
        }
        _ => Err(ConfigError::InvalidKey(key.to_string())),
    }
}

fn render_value(value: &toml_edit::Value) -> String {
    if let Some(s) = value.as_str() {
        return s.to_string();
    }
    // Strip surrounding whitespace and trailing comments
    let mut bare = value.clone();
    bare.decor_mut().clear();
    bare.to_string()
}
