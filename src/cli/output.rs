use serde::Serialize;

use crate::io::kv::KvStore;
use crate::io::recovery::RecoveryEntry;
use crate::model::config::DisplayConfig;
use crate::model::folder::Folder;
use crate::model::task::Task;
use crate::ops::stats::{StoreStats, TaskCounts};
use crate::ops::store::Store;
use crate::util::unicode::{display_width, pad_to_width, single_line, truncate_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: u64,
    pub description: String,
    pub starred: bool,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct FolderJson {
    pub id: u64,
    pub name: String,
    pub tasks: Vec<u64>,
    pub active: bool,
}

#[derive(Serialize)]
pub struct ViewJson {
    pub view: String,
    pub filters: Vec<String>,
}

#[derive(Serialize)]
pub struct CountsJson {
    pub total: usize,
    pub todo: usize,
    pub done: usize,
    pub starred: usize,
}

#[derive(Serialize)]
pub struct FolderStatsJson {
    pub name: String,
    #[serde(flatten)]
    pub counts: CountsJson,
}

#[derive(Serialize)]
pub struct RecoveryJson {
    pub timestamp: String,
    pub category: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub folders: Vec<FolderStatsJson>,
    pub unfiled: CountsJson,
    pub totals: CountsJson,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json<S: KvStore>(task: &Task, store: &Store<S>) -> TaskJson {
    TaskJson {
        id: task.id,
        description: task.description.clone(),
        starred: task.starred,
        done: task.is_done(),
        folder: store.folder_of(task.id).map(|f| f.name.clone()),
        date: task.date.clone(),
    }
}

pub fn folder_to_json<S: KvStore>(folder: &Folder, store: &Store<S>) -> FolderJson {
    FolderJson {
        id: folder.id,
        name: folder.name.clone(),
        tasks: folder.tasks.clone(),
        active: is_active_folder(folder, store),
    }
}

fn is_active_folder<S: KvStore>(folder: &Folder, store: &Store<S>) -> bool {
    !store.active_view().is_all() && store.active_view().name() == folder.name
}

pub fn view_to_json<S: KvStore>(store: &Store<S>) -> ViewJson {
    ViewJson {
        view: store.active_view().name().to_string(),
        filters: store.filters().iter().map(|t| t.as_str().to_string()).collect(),
    }
}

fn counts_to_json(counts: &TaskCounts) -> CountsJson {
    CountsJson {
        total: counts.total,
        todo: counts.todo,
        done: counts.done,
        starred: counts.starred,
    }
}

pub fn stats_to_json(stats: &StoreStats) -> StatsJson {
    StatsJson {
        folders: stats
            .folders
            .iter()
            .map(|f| FolderStatsJson {
                name: f.name.clone(),
                counts: counts_to_json(&f.counts),
            })
            .collect(),
        unfiled: counts_to_json(&stats.unfiled),
        totals: counts_to_json(&stats.totals),
    }
}

pub fn recovery_to_json(entry: &RecoveryEntry) -> RecoveryJson {
    RecoveryJson {
        timestamp: entry.timestamp.to_rfc3339(),
        category: entry.category.to_string(),
        description: entry.description.clone(),
        fields: entry.fields.clone(),
        body: entry.body.clone(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// A task row plus the name of the folder it is filed under, if any.
pub struct TaskRow<'a> {
    pub task: &'a Task,
    pub folder: Option<&'a str>,
}

impl<'a> TaskRow<'a> {
    pub fn of<S: KvStore>(task: &'a Task, store: &'a Store<S>) -> Self {
        TaskRow {
            task,
            folder: store.folder_of(task.id).map(|f| f.name.as_str()),
        }
    }
}

/// Render one task as `[x] * 12 description  @Folder`.
pub fn format_task_line(row: &TaskRow, id_width: usize, display: &DisplayConfig) -> String {
    let task = row.task;
    let mut line = format!(
        "[{}] {}",
        task.state.checkbox_char(),
        if task.starred { '*' } else { ' ' }
    );
    if display.show_ids {
        line.push(' ');
        let id = task.id.to_string();
        line.push_str(&" ".repeat(id_width.saturating_sub(id.len())));
        line.push_str(&id);
    }
    line.push(' ');
    line.push_str(&truncate_to_width(&single_line(&task.description), display.width));
    if let Some(folder) = row.folder {
        line.push_str("  @");
        line.push_str(folder);
    }
    line.trim_end().to_string()
}

/// Render a list of tasks, one per line. An empty list prints `No tasks`.
pub fn format_task_list(rows: &[TaskRow], display: &DisplayConfig) -> String {
    if rows.is_empty() {
        return "No tasks\n".to_string();
    }
    let id_width = rows
        .iter()
        .map(|r| r.task.id.to_string().len())
        .max()
        .unwrap_or(1);
    let mut out = String::new();
    for row in rows {
        out.push_str(&format_task_line(row, id_width, display));
        out.push('\n');
    }
    out
}

/// Render folders with member counts; the active one is marked with `>`.
pub fn format_folder_list<S: KvStore>(store: &Store<S>) -> String {
    let name_width = store
        .folders()
        .iter()
        .map(|f| display_width(&f.name))
        .chain(std::iter::once(3))
        .max()
        .unwrap_or(3);

    let mut out = String::new();
    let marker = |active: bool| if active { '>' } else { ' ' };
    out.push_str(&format!(
        "{}    {}  {}\n",
        marker(store.active_view().is_all()),
        pad_to_width("All", name_width),
        store.tasks().len()
    ));
    for folder in store.folders() {
        let active = is_active_folder(folder, store);
        out.push_str(&format!(
            "{} {:>2} {}  {}\n",
            marker(active),
            folder.id,
            pad_to_width(&folder.name, name_width),
            folder.tasks.len()
        ));
    }
    out
}

pub fn format_view<S: KvStore>(store: &Store<S>) -> String {
    format!("view: {}\nfilters: {}\n", store.active_view(), store.filters())
}

pub fn format_stats(stats: &StoreStats) -> String {
    let mut rows: Vec<(String, &TaskCounts)> = stats
        .folders
        .iter()
        .map(|f| (f.name.clone(), &f.counts))
        .collect();
    rows.push(("(unfiled)".to_string(), &stats.unfiled));
    rows.push(("Total".to_string(), &stats.totals));

    let name_width = rows
        .iter()
        .map(|(name, _)| display_width(name))
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{}  {:>5} {:>5} {:>5} {:>5}\n",
        pad_to_width("", name_width),
        "todo",
        "done",
        "star",
        "total"
    );
    for (name, c) in rows {
        out.push_str(&format!(
            "{}  {:>5} {:>5} {:>5} {:>5}\n",
            pad_to_width(&name, name_width),
            c.todo,
            c.done,
            c.starred,
            c.total
        ));
    }
    out
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> String {
    let mut out = format!(
        "{} [{}] {}\n",
        entry
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        entry.category,
        entry.description
    );
    for (key, value) in &entry.fields {
        out.push_str(&format!("  {}: {}\n", key, value));
    }
    for line in entry.body.lines() {
        out.push_str("  | ");
        out.push_str(line);
        out.push('\n');
    }
    out
}
