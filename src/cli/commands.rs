use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tl", about = concat!("ticklist v", env!("CARGO_PKG_VERSION"), " - tasks, stars and folders"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task (newest first)
    Add(AddArgs),
    /// Delete a task
    Rm(TaskIdArg),
    /// Toggle a task between to-do and done
    Check(TaskIdArg),
    /// Toggle a task's star
    Star(TaskIdArg),
    /// Folder management
    Folder(FolderCmd),
    /// List folders
    Folders,
    /// Show or select the folder the list is scoped to
    View(ViewArgs),
    /// Show the active filters, or toggle one (all, todo, done, starred)
    Filter(FilterArgs),
    /// List tasks in the current view through the active filters
    List,
    /// Search task descriptions by regex
    Search(SearchArgs),
    /// Show task counts per folder
    Stats,
    /// Read or change config.toml
    Config(ConfigArgs),
    /// View or prune the recovery log
    Recovery(RecoveryArgs),
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task description
    pub description: String,
    /// Star the new task
    #[arg(short, long)]
    pub star: bool,
    /// File the task under this folder
    #[arg(short, long)]
    pub folder: Option<String>,
}

#[derive(Args)]
pub struct TaskIdArg {
    /// Task ID
    pub id: u64,
}

// ---------------------------------------------------------------------------
// Folder args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FolderCmd {
    #[command(subcommand)]
    pub action: FolderAction,
}

#[derive(Subcommand)]
pub enum FolderAction {
    /// Create a folder
    Add(FolderNameArg),
    /// Delete a folder and every task in it
    Rm(FolderIdArg),
}

#[derive(Args)]
pub struct FolderNameArg {
    /// Folder name
    pub name: String,
}

#[derive(Args)]
pub struct FolderIdArg {
    /// Folder ID
    pub id: u64,
}

// ---------------------------------------------------------------------------
// View / filter / query args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ViewArgs {
    /// Folder name, or `All` (omit to show the current view)
    pub name: Option<String>,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Token to toggle (omit to show the active filters)
    pub token: Option<String>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern to search for
    pub pattern: String,
    /// Only search tasks the current view and filters show
    #[arg(long)]
    pub visible: bool,
}

// ---------------------------------------------------------------------------
// Maintenance args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigArgs {
    /// Dotted key such as `display.width` (omit to print the file)
    pub key: Option<String>,
    /// New value (omit to read the key)
    pub value: Option<String>,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "10")]
    pub limit: usize,
    /// Remove entries older than 30 days
    #[arg(long)]
    pub prune: bool,
    /// With --prune, remove every entry
    #[arg(long, requires = "prune")]
    pub all: bool,
}
