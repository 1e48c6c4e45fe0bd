//! The recovery log: `<data_dir>/.recovery.log`.
//!
//! Whenever the store throws data away (an unreadable stored value) or fails
//! to persist it (a rejected write), the raw text is appended here as a
//! markdown entry so nothing the user typed is silently lost:
//!
//! ````text
//! ## 2025-06-01T12:00:00Z [parser] discarded unreadable tasks
//!
//! Key: tasks
//! Error: expected value at line 1 column 1
//!
//! ```text
//! [{broken
//! ```
//!
//! ---
//! ````

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::file_store::atomic_write;

/// Once the log grows past this many bytes, entries older than
/// [`PRUNE_AGE_DAYS`] are dropped before the next append.
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Age after which entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

const LOG_FILE: &str = ".recovery.log";

const FILE_HEADER: &str = "\
<!-- ticklist recovery log: data that could not be loaded or saved normally.
     View with: tl recovery
     Safe to delete once you have what you need. -->

---
";

const FENCE_OPEN: &str = "```text";
const FENCE_CLOSE: &str = "```";
const ENTRY_END: &str = "---";

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A stored value could not be decoded and was replaced with a default
    Parser,
    /// A value could not be written to storage
    Write,
}

impl RecoveryCategory {
    fn as_str(self) -> &'static str {
        match self {
            RecoveryCategory::Parser => "parser",
            RecoveryCategory::Write => "write",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        [RecoveryCategory::Parser, RecoveryCategory::Write]
            .into_iter()
            .find(|c| c.as_str() == name)
    }
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    /// The raw text that was dropped or could not be saved
    pub body: String,
}

impl RecoveryEntry {
    fn for_key(
        category: RecoveryCategory,
        description: String,
        key: &str,
        error: &str,
        body: &str,
    ) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description,
            fields: vec![
                ("Key".to_string(), key.to_string()),
                ("Error".to_string(), single_line(error)),
            ],
            body: body.to_string(),
        }
    }

    /// A stored value under `key` that failed to decode.
    pub fn unreadable(key: &str, error: &str, raw: &str) -> Self {
        Self::for_key(
            RecoveryCategory::Parser,
            format!("discarded unreadable {}", key),
            key,
            error,
            raw,
        )
    }

    /// A value for `key` that the backend refused.
    pub fn unsaved(key: &str, error: &str, payload: &str) -> Self {
        Self::for_key(
            RecoveryCategory::Write,
            format!("could not save {}", key),
            key,
            error,
            payload,
        )
    }

    /// Parse one entry from the lines between two `---` separators.
    /// Returns `None` for blocks without a valid `## ` heading.
    fn from_block(lines: &[&str]) -> Option<Self> {
        let mut rest = lines.iter().skip_while(|l| !l.starts_with("## "));
        let heading = rest.next()?.strip_prefix("## ")?;

        let (stamp, after) = heading.split_once(" [")?;
        let (category, description) = after.split_once("] ")?;
        let timestamp = DateTime::parse_from_rfc3339(stamp).ok()?.with_timezone(&Utc);
        let category = RecoveryCategory::from_name(category)?;

        let mut fields = Vec::new();
        let mut body_lines: Vec<&str> = Vec::new();
        let mut fenced = false;
        for &line in rest {
            if fenced {
                if line == FENCE_CLOSE {
                    fenced = false;
                } else {
                    body_lines.push(line);
                }
            } else if line.starts_with(FENCE_CLOSE) {
                fenced = true;
            } else if let Some((k, v)) = line.split_once(": ") {
                fields.push((k.trim().to_string(), v.to_string()));
            }
        }

        Some(RecoveryEntry {
            timestamp,
            category,
            description: description.to_string(),
            fields,
            body: body_lines.join("\n"),
        })
    }
}

/// Markdown form as stored in the log, terminated by a `---` line.
impl fmt::Display for RecoveryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## {} [{}] {}",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description
        )?;
        writeln!(f)?;
        for (key, value) in &self.fields {
            writeln!(f, "{}: {}", key, value)?;
        }
        if !self.body.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", FENCE_OPEN)?;
            writeln!(f, "{}", self.body.trim_end_matches('\n'))?;
            writeln!(f, "{}", FENCE_CLOSE)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", ENTRY_END)
    }
}

fn single_line(s: &str) -> String {
    s.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

/// Split log text into entry blocks on `---` lines outside code fences.
/// The leading header block has no heading and is skipped by the parser.
fn parse_log(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut fenced = false;

    for line in content.lines() {
        if !fenced && line == ENTRY_END {
            entries.extend(RecoveryEntry::from_block(&block));
            block.clear();
            continue;
        }
        if fenced {
            fenced = line != FENCE_CLOSE;
        } else {
            fenced = line.starts_with(FENCE_CLOSE);
        }
        block.push(line);
    }
    entries.extend(RecoveryEntry::from_block(&block));
    entries
}

// ---------------------------------------------------------------------------
// The log file
// ---------------------------------------------------------------------------

/// Handle on the recovery log of one data directory.
#[derive(Debug, Clone)]
pub struct RecoveryLog {
    path: PathBuf,
}

impl RecoveryLog {
    pub fn in_dir(data_dir: &Path) -> Self {
        RecoveryLog {
            path: recovery_log_path(data_dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, writing the file header first if the log is new.
    pub fn append(&self, entry: &RecoveryEntry) -> io::Result<()> {
        let size = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        if size > MAX_LOG_SIZE {
            let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
            if let Err(e) = self.retain(|entry| entry.timestamp >= cutoff) {
                tracing::warn!(error = %e, path = %self.path.display(), "could not trim recovery log");
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if file.metadata()?.len() == 0 {
            file.write_all(FILE_HEADER.as_bytes())?;
        }
        file.write_all(entry.to_string().as_bytes())
    }

    /// All entries, oldest first. A missing log has none.
    pub fn entries(&self) -> io::Result<Vec<RecoveryEntry>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse_log(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Rewrite the log keeping only entries for which `keep` holds.
    /// Returns how many were removed.
    pub fn retain(&self, keep: impl Fn(&RecoveryEntry) -> bool) -> io::Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let entries = self.entries()?;
        let before = entries.len();

        let mut text = String::from(FILE_HEADER);
        let mut kept = 0;
        for entry in &entries {
            if keep(entry) {
                text.push_str(&entry.to_string());
                kept += 1;
            }
        }
        atomic_write(&self.path, text.as_bytes())?;
        Ok(before - kept)
    }
}

pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

/// Append an entry to the log under `data_dir`. Failures only warn.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    let log = RecoveryLog::in_dir(data_dir);
    if let Err(e) = log.append(&entry) {
        tracing::warn!(error = %e, path = %log.path().display(), "could not write to recovery log");
    }
}

/// Entries newest first, at most `limit` of them. An unreadable log reads
/// as empty.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let mut entries = RecoveryLog::in_dir(data_dir).entries().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read recovery log");
        Vec::new()
    });
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

/// Drop every entry (`all`), or those older than `before`
/// (default [`PRUNE_AGE_DAYS`] ago). Returns the number removed.
pub fn prune_recovery(
    data_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let log = RecoveryLog::in_dir(data_dir);
    if all {
        return log.retain(|_| false);
    }
    let cutoff = before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
    log.retain(|e| e.timestamp >= cutoff)
}
