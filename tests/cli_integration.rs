//! Integration tests for the `tl` CLI.
//!
//! Each test creates a temp data directory, runs `tl -C <dir>` as a
//! subprocess, and verifies stdout and/or the stored JSON files.

use std::fs;
use std::path::Path;
use std::process::Command;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Run `tl` against the given data directory, returning (stdout, stderr, success).
fn run_tl(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_tl"))
        .arg("-C")
        .arg(dir)
        .args(args)
        .env_remove("TICKLIST_LOG")
        .env_remove("TICKLIST_DIR")
        .output()
        .expect("failed to run tl");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `tl` expecting success, return stdout.
fn run_tl_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tl(dir, args);
    if !success {
        panic!(
            "tl {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `tl` expecting failure, return stderr.
fn run_tl_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tl(dir, args);
    if success {
        panic!("tl {:?} unexpectedly succeeded:\nstdout: {}", args, stdout);
    }
    stderr
}

fn stored_json(dir: &Path, key: &str) -> serde_json::Value {
    let text = fs::read_to_string(dir.join(format!("{}.json", key))).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// Two folders and three tasks: "Buy milk" (1), "Write report" (2, starred,
/// in Work), "Call mom" (3, in Home).
fn seeded() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    run_tl_ok(dir, &["folder", "add", "Work"]);
    run_tl_ok(dir, &["folder", "add", "Home"]);
    run_tl_ok(dir, &["add", "Buy milk"]);
    run_tl_ok(dir, &["add", "Write report", "--star", "--folder", "Work"]);
    run_tl_ok(dir, &["add", "Call mom", "-f", "Home"]);
    tmp
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

#[test]
fn test_add_prints_id_and_persists() {
    let tmp = TempDir::new().unwrap();
    let out = run_tl_ok(tmp.path(), &["add", "Buy milk"]);
    assert_eq!(out, "1\n");

    let tasks = stored_json(tmp.path(), "tasks");
    assert_eq!(
        tasks,
        serde_json::json!([{"id": 1, "description": "Buy milk", "starred": false, "state": false}])
    );
}

#[test]
fn test_add_stores_description_verbatim() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(run_tl_ok(tmp.path(), &["add", ""]), "1\n");
    assert_eq!(run_tl_ok(tmp.path(), &["add", "  padded  "]), "2\n");

    let tasks = stored_json(tmp.path(), "tasks");
    assert_eq!(tasks[0]["description"], "  padded  ");
    assert_eq!(tasks[1]["description"], "");
}

#[test]
fn test_folder_add_keeps_name_verbatim() {
    let tmp = TempDir::new().unwrap();
    run_tl_ok(tmp.path(), &["folder", "add", " Side "]);
    run_tl_ok(tmp.path(), &["add", "x", "--folder", " Side "]);

    let folders = stored_json(tmp.path(), "folders");
    assert_eq!(folders[0]["name"], " Side ");
    assert_eq!(folders[0]["tasks"], serde_json::json!([1]));
}

#[test]
fn test_add_into_unknown_folder_fails() {
    let tmp = TempDir::new().unwrap();
    let err = run_tl_err(tmp.path(), &["add", "x", "--folder", "Nope"]);
    assert!(err.contains("folder not found: Nope"));
}

#[test]
fn test_list_newest_first() {
    let tmp = seeded();
    let out = run_tl_ok(tmp.path(), &["list"]);
    assert_eq!(
        out,
        "[ ]   3 Call mom  @Home\n[ ] * 2 Write report  @Work\n[ ]   1 Buy milk\n"
    );
}

#[test]
fn test_list_empty() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(run_tl_ok(tmp.path(), &["list"]), "No tasks\n");
}

#[test]
fn test_check_and_star() {
    let tmp = seeded();
    let out = run_tl_ok(tmp.path(), &["check", "1"]);
    assert_eq!(out, "[x]   1 Buy milk\n");
    let out = run_tl_ok(tmp.path(), &["star", "1"]);
    assert_eq!(out, "[x] * 1 Buy milk\n");

    let tasks = stored_json(tmp.path(), "tasks");
    let milk = tasks
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == 1)
        .unwrap();
    assert_eq!(milk["state"], true);
    assert_eq!(milk["starred"], true);
}

#[test]
fn test_unknown_task_ids_fail() {
    let tmp = seeded();
    for cmd in ["check", "star", "rm"] {
        let err = run_tl_err(tmp.path(), &[cmd, "99"]);
        assert!(err.contains("task not found: 99"), "{}: {}", cmd, err);
    }
}

#[test]
fn test_rm_strips_folder_membership() {
    let tmp = seeded();
    let out = run_tl_ok(tmp.path(), &["rm", "2"]);
    assert_eq!(out, "deleted 2: Write report\n");

    let folders = stored_json(tmp.path(), "folders");
    let work = folders
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "Work")
        .unwrap();
    assert_eq!(work["tasks"], serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// Folder commands
// ---------------------------------------------------------------------------

#[test]
fn test_folder_rm_cascades() {
    let tmp = seeded();
    let out = run_tl_ok(tmp.path(), &["folder", "rm", "1"]);
    assert_eq!(out, "deleted folder Work and 1 task\n");

    let list = run_tl_ok(tmp.path(), &["list"]);
    assert!(!list.contains("Write report"));
    assert!(list.contains("Buy milk"));
}

#[test]
fn test_folder_rm_unknown_fails() {
    let tmp = seeded();
    let err = run_tl_err(tmp.path(), &["folder", "rm", "42"]);
    assert!(err.contains("folder not found: 42"));
}

#[test]
fn test_folder_named_all_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let err = run_tl_err(tmp.path(), &["folder", "add", "All"]);
    assert!(err.contains("reserved"));
}

#[test]
fn test_folders_json() {
    let tmp = seeded();
    let out = run_tl_ok(tmp.path(), &["--json", "folders"]);
    let folders: serde_json::Value = serde_json::from_str(&out).unwrap();
    // Filing a task moves its folder to the front
    assert_eq!(folders[0]["name"], "Home");
    assert_eq!(folders[0]["tasks"], serde_json::json!([3]));
    assert_eq!(folders[1]["name"], "Work");
    assert_eq!(folders[1]["active"], false);
}

// ---------------------------------------------------------------------------
// View and filters
// ---------------------------------------------------------------------------

#[test]
fn test_view_scopes_list_and_persists() {
    let tmp = seeded();
    let out = run_tl_ok(tmp.path(), &["view", "Work"]);
    assert_eq!(out, "view: Work\nfilters: {all}\n");

    let list = run_tl_ok(tmp.path(), &["list"]);
    assert_eq!(list, "[ ] * 2 Write report  @Work\n");

    assert_eq!(
        stored_json(tmp.path(), "ui"),
        serde_json::json!({"view": "Work", "filters": ["all"]})
    );
}

#[test]
fn test_view_unknown_folder_fails() {
    let tmp = seeded();
    let err = run_tl_err(tmp.path(), &["view", "Play"]);
    assert!(err.contains("folder not found: Play"));
    assert_eq!(run_tl_ok(tmp.path(), &["view"]), "view: All\nfilters: {all}\n");
}

#[test]
fn test_add_returns_view_to_all() {
    let tmp = seeded();
    run_tl_ok(tmp.path(), &["view", "Work"]);
    run_tl_ok(tmp.path(), &["add", "Another", "-f", "Work"]);
    assert_eq!(run_tl_ok(tmp.path(), &["view"]), "view: All\nfilters: {all}\n");
}

#[test]
fn test_filter_toggles() {
    let tmp = seeded();
    run_tl_ok(tmp.path(), &["check", "3"]);

    let out = run_tl_ok(tmp.path(), &["filter", "todo"]);
    assert_eq!(out, "view: All\nfilters: {todo}\n");
    let list = run_tl_ok(tmp.path(), &["list"]);
    assert!(!list.contains("Call mom"));

    let out = run_tl_ok(tmp.path(), &["filter", "done"]);
    assert_eq!(out, "view: All\nfilters: {done}\n");
    let out = run_tl_ok(tmp.path(), &["filter", "starred"]);
    assert_eq!(out, "view: All\nfilters: {done,starred}\n");
    assert_eq!(run_tl_ok(tmp.path(), &["list"]), "No tasks\n");

    let out = run_tl_ok(tmp.path(), &["filter", "all"]);
    assert_eq!(out, "view: All\nfilters: {all}\n");
}

#[test]
fn test_list_json_reflects_filters() {
    let tmp = seeded();
    run_tl_ok(tmp.path(), &["filter", "starred"]);
    let out = run_tl_ok(tmp.path(), &["--json", "list"]);
    let tasks: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        tasks,
        serde_json::json!([{
            "id": 2,
            "description": "Write report",
            "starred": true,
            "done": false,
            "folder": "Work"
        }])
    );
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn test_search() {
    let tmp = seeded();
    let out = run_tl_ok(tmp.path(), &["search", "(?i)^(buy|call)"]);
    assert_eq!(out, "[ ]   3 Call mom  @Home\n[ ]   1 Buy milk\n");
    assert_eq!(run_tl_ok(tmp.path(), &["search", "zzz"]), "No matches\n");
}

#[test]
fn test_search_invalid_regex_fails() {
    let tmp = seeded();
    run_tl_err(tmp.path(), &["search", "("]);
}

#[test]
fn test_stats_json() {
    let tmp = seeded();
    run_tl_ok(tmp.path(), &["check", "1"]);
    let out = run_tl_ok(tmp.path(), &["--json", "stats"]);
    let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        stats["totals"],
        serde_json::json!({"total": 3, "todo": 2, "done": 1, "starred": 1})
    );
    assert_eq!(stats["unfiled"]["done"], 1);
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

#[test]
fn test_config_edit_preserves_comments() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "# my settings\n[display]\nwidth = 40 # narrow terminal\n",
    )
    .unwrap();

    run_tl_ok(tmp.path(), &["config", "display.show_ids", "false"]);
    assert_eq!(run_tl_ok(tmp.path(), &["config", "display.width"]), "40\n");
    assert_eq!(
        run_tl_ok(tmp.path(), &["config", "display.show_ids"]),
        "false\n"
    );

    let text = fs::read_to_string(tmp.path().join("config.toml")).unwrap();
    assert!(text.contains("# my settings"));
    assert!(text.contains("# narrow terminal"));
}

#[test]
fn test_config_rejects_bad_type() {
    let tmp = TempDir::new().unwrap();
    run_tl_err(tmp.path(), &["config", "display.width", "wide"]);
    assert!(!tmp.path().join("config.toml").exists());
}

#[test]
fn test_config_display_applies_to_list() {
    let tmp = seeded();
    run_tl_ok(tmp.path(), &["config", "display.show_ids", "false"]);
    run_tl_ok(tmp.path(), &["config", "display.width", "6"]);
    let out = run_tl_ok(tmp.path(), &["list"]);
    assert_eq!(out, "[ ]   Call …  @Home\n[ ] * Write…  @Work\n[ ]   Buy m…\n");
}

#[test]
fn test_malformed_tasks_recovered() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("tasks.json"), "[{not json").unwrap();

    let (stdout, stderr, success) = run_tl(tmp.path(), &["list"]);
    assert!(success);
    assert_eq!(stdout, "No tasks\n");
    assert!(stderr.contains("WARN"));

    let out = run_tl_ok(tmp.path(), &["recovery"]);
    assert!(out.contains("[parser] discarded unreadable tasks"));
    assert!(out.contains("| [{not json"));

    let out = run_tl_ok(tmp.path(), &["recovery", "--prune", "--all"]);
    assert_eq!(out, "pruned 1 recovery entries\n");
    assert_eq!(run_tl_ok(tmp.path(), &["recovery"]), "No recovery entries\n");
}
