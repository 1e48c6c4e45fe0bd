use std::path::Path;

use regex::Regex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::file_store::FileStore;
use crate::io::recovery;
use crate::model::config::Config;
use crate::model::filter::FilterToken;
use crate::model::task::TaskId;
use crate::model::view::FolderView;
use crate::ops::search::{self, SearchScope};
use crate::ops::stats;
use crate::ops::store::{NewTask, Store};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref());

    match cli.command {
        // Maintenance (no store needed)
        Commands::Config(args) => cmd_config(&data_dir, args),
        Commands::Recovery(args) => cmd_recovery(&data_dir, args, json),

        // Read commands
        Commands::Folders => cmd_folders(&open_session(&data_dir)?, json),
        Commands::List => cmd_list(&open_session(&data_dir)?, json),
        Commands::Search(args) => cmd_search(&open_session(&data_dir)?, args, json),
        Commands::Stats => cmd_stats(&open_session(&data_dir)?, json),

        // Write commands
        Commands::Add(args) => cmd_add(&mut open_session(&data_dir)?, args, json),
        Commands::Rm(args) => cmd_rm(&mut open_session(&data_dir)?, args.id),
        Commands::Check(args) => cmd_check(&mut open_session(&data_dir)?, args.id, json),
        Commands::Star(args) => cmd_star(&mut open_session(&data_dir)?, args.id, json),
        Commands::Folder(cmd) => match cmd.action {
            FolderAction::Add(args) => cmd_folder_add(&mut open_session(&data_dir)?, args, json),
            FolderAction::Rm(args) => cmd_folder_rm(&mut open_session(&data_dir)?, args.id),
        },
        Commands::View(args) => cmd_view(&mut open_session(&data_dir)?, args, json),
        Commands::Filter(args) => cmd_filter(&mut open_session(&data_dir)?, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Everything one command invocation needs: the loaded store and the config
/// that shaped it.
struct Session {
    config: Config,
    store: Store<FileStore>,
}

fn open_session(data_dir: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let (config, _) = config_io::read_config(data_dir)?;
    let backend = FileStore::open(data_dir)?;
    let mut store = Store::new(backend)
        .with_pretty(config.storage.pretty)
        .with_recovery_dir(data_dir);
    store.load();
    Ok(Session { config, store })
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_folders(session: &Session, json: bool) -> CmdResult {
    let store = &session.store;
    if json {
        let folders: Vec<FolderJson> = store
            .folders()
            .iter()
            .map(|f| folder_to_json(f, store))
            .collect();
        return print_json(&folders);
    }
    print!("{}", format_folder_list(store));
    Ok(())
}

fn cmd_list(session: &Session, json: bool) -> CmdResult {
    let store = &session.store;
    let visible = store.visible_tasks();
    if json {
        let tasks: Vec<TaskJson> = visible.iter().map(|t| task_to_json(t, store)).collect();
        return print_json(&tasks);
    }
    let rows: Vec<TaskRow> = visible.iter().map(|t| TaskRow::of(t, store)).collect();
    print!("{}", format_task_list(&rows, &session.config.display));
    Ok(())
}

fn cmd_search(session: &Session, args: SearchArgs, json: bool) -> CmdResult {
    let store = &session.store;
    let re = Regex::new(&args.pattern)?;
    let scope = if args.visible {
        SearchScope::Visible
    } else {
        SearchScope::Everything
    };
    let hits = search::search_tasks(store, &re, scope);
    let matched: Vec<_> = hits.iter().filter_map(|hit| store.task(hit.task_id)).collect();

    if json {
        let tasks: Vec<TaskJson> = matched.iter().map(|t| task_to_json(t, store)).collect();
        return print_json(&tasks);
    }
    if matched.is_empty() {
        println!("No matches");
        return Ok(());
    }
    let rows: Vec<TaskRow> = matched.iter().map(|t| TaskRow::of(t, store)).collect();
    print!("{}", format_task_list(&rows, &session.config.display));
    Ok(())
}

fn cmd_stats(session: &Session, json: bool) -> CmdResult {
    let stats = stats::store_stats(&session.store);
    if json {
        return print_json(&stats_to_json(&stats));
    }
    print!("{}", format_stats(&stats));
    Ok(())
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add(session: &mut Session, args: AddArgs, json: bool) -> CmdResult {
    let folder = match args.folder.as_deref() {
        Some(name) => {
            let view = FolderView::parse(name);
            if !view.is_all() && session.store.folder_by_name(name).is_none() {
                return Err(format!("folder not found: {}", name).into());
            }
            view
        }
        None => FolderView::All,
    };

    let task = session.store.add_task(
        NewTask::new(args.description)
            .starred(args.star)
            .in_folder(folder),
    );
    if json {
        return print_json(&task_to_json(&task, &session.store));
    }
    println!("{}", task.id);
    Ok(())
}

fn cmd_rm(session: &mut Session, id: TaskId) -> CmdResult {
    let removed = session
        .store
        .delete_task(id)
        .ok_or_else(|| format!("task not found: {}", id))?;
    println!("deleted {}: {}", removed.id, removed.description);
    Ok(())
}

fn cmd_check(session: &mut Session, id: TaskId, json: bool) -> CmdResult {
    let task = session
        .store
        .toggle_task_state(id)
        .ok_or_else(|| format!("task not found: {}", id))?;
    if json {
        return print_json(&task_to_json(&task, &session.store));
    }
    let row = TaskRow::of(&task, &session.store);
    println!("{}", format_task_line(&row, 1, &session.config.display));
    Ok(())
}

fn cmd_star(session: &mut Session, id: TaskId, json: bool) -> CmdResult {
    let task = session
        .store
        .toggle_task_starred(id)
        .ok_or_else(|| format!("task not found: {}", id))?;
    if json {
        return print_json(&task_to_json(&task, &session.store));
    }
    let row = TaskRow::of(&task, &session.store);
    println!("{}", format_task_line(&row, 1, &session.config.display));
    Ok(())
}

// ---------------------------------------------------------------------------
// Folder commands
// ---------------------------------------------------------------------------

fn cmd_folder_add(session: &mut Session, args: FolderNameArg, json: bool) -> CmdResult {
    if FolderView::parse(&args.name).is_all() {
        return Err(format!("'{}' is reserved for the unscoped view", args.name).into());
    }
    let folder = session.store.add_folder(args.name);
    if json {
        return print_json(&folder_to_json(&folder, &session.store));
    }
    println!("{}", folder.id);
    Ok(())
}

fn cmd_folder_rm(session: &mut Session, id: u64) -> CmdResult {
    let removed = session
        .store
        .delete_folder(id)
        .ok_or_else(|| format!("folder not found: {}", id))?;
    match removed.tasks.len() {
        0 => println!("deleted folder {}", removed.name),
        1 => println!("deleted folder {} and 1 task", removed.name),
        n => println!("deleted folder {} and {} tasks", removed.name, n),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// View and filters
// ---------------------------------------------------------------------------

fn cmd_view(session: &mut Session, args: ViewArgs, json: bool) -> CmdResult {
    if let Some(name) = args.name.as_deref() {
        session.store.set_active_folder_view(FolderView::parse(name))?;
    }
    if json {
        return print_json(&view_to_json(&session.store));
    }
    print!("{}", format_view(&session.store));
    Ok(())
}

fn cmd_filter(session: &mut Session, args: FilterArgs, json: bool) -> CmdResult {
    if let Some(raw) = args.token.as_deref() {
        let token = FilterToken::parse(raw.trim());
        if let FilterToken::Custom(name) = &token {
            tracing::warn!(token = %name, "custom filter token matches every task");
        }
        session.store.toggle_filter(token);
    }
    if json {
        return print_json(&view_to_json(&session.store));
    }
    print!("{}", format_view(&session.store));
    Ok(())
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

fn cmd_config(data_dir: &Path, args: ConfigArgs) -> CmdResult {
    let (_, mut doc) = config_io::read_config(data_dir)?;
    match (args.key.as_deref(), args.value.as_deref()) {
        (None, _) => print!("{}", doc),
        (Some(key), None) => match config_io::get_value(&doc, key)? {
            Some(value) => println!("{}", value),
            None => return Err(format!("config key not set: {}", key).into()),
        },
        (Some(key), Some(value)) => {
            config_io::set_value(&mut doc, key, value)?;
            // Reject edits that would leave config.toml unreadable
            toml::from_str::<Config>(&doc.to_string())?;
            std::fs::create_dir_all(data_dir)?;
            config_io::write_config(data_dir, &doc)?;
        }
    }
    Ok(())
}

fn cmd_recovery(data_dir: &Path, args: RecoveryArgs, json: bool) -> CmdResult {
    if args.prune {
        let removed = recovery::prune_recovery(data_dir, None, args.all)?;
        println!("pruned {} recovery entries", removed);
        return Ok(());
    }

    let entries = recovery::read_recovery_entries(data_dir, Some(args.limit));
    if json {
        let out: Vec<RecoveryJson> = entries.iter().map(recovery_to_json).collect();
        return print_json(&out);
    }
    if entries.is_empty() {
        println!("No recovery entries");
        return Ok(());
    }
    let log_path = recovery::recovery_log_path(data_dir);
    for entry in &entries {
        print!("{}", format_recovery_entry(entry));
    }
    println!("({})", log_path.display());
    Ok(())
}
