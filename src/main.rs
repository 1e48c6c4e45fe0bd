use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ticklist::cli::commands::Cli;
use ticklist::cli::handlers;
use ticklist::io::config_io;

/// Environment variable holding an env-filter directive, e.g. `ticklist=debug`.
const LOG_ENV: &str = "TICKLIST_LOG";

fn main() {
    let cli = Cli::parse();
    let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref());

    // A broken config.toml is reported by the command itself
    let configured_level = config_io::read_config(&data_dir)
        .map(|(config, _)| config.log.level)
        .unwrap_or_else(|_| "warn".to_string());
    init_tracing(&configured_level);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(configured_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(configured_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .without_time(),
        )
        .try_init();
}
