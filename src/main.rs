mod config;
mod debounce;
mod engine;
mod error;
mod fs;
mod search;
mod view;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use clap::Parser;
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::AppConfig;
use crate::debounce::Debounce;
use crate::engine::{Engine, EngineHandle};
use crate::error::AppError;
use crate::fs::watcher::{KnownNames, TreeWatcher};
use crate::search::{SearchMode, SearchOutcome};

/// Headless file-navigation engine with a line-oriented search driver.
#[derive(Parser, Debug)]
#[command(name = "fnav", version, about)]
struct Cli {
    /// Root path to navigate (defaults to current directory)
    path: Option<PathBuf>,

    /// Disable filesystem watcher (auto-refresh)
    #[arg(long)]
    no_watcher: bool,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> error::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref());

    let requested = cli
        .path
        .clone()
        .or_else(|| config.general.default_path.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let root = requested.canonicalize().map_err(|_| {
        AppError::InvalidPath(format!("{} does not exist", requested.display()))
    })?;

    let known: KnownNames = Arc::new(RwLock::new(HashSet::new()));
    let handle = Engine::spawn(root.clone(), Arc::clone(&known));

    let rebuild_handle = handle.clone();
    let debounce = Debounce::new(Duration::from_millis(config.quiet_ms()), move || {
        rebuild_handle.request_rebuild()
    });

    // Watcher events only pull the trigger; the debounce worker decides
    // when the engine actually rebuilds.
    let _watcher = if cli.no_watcher || !config.watcher_enabled() {
        None
    } else {
        let trigger = debounce.clone();
        match TreeWatcher::new(&root, config.strict_events(), Arc::clone(&known), move |_| {
            trigger.trigger()
        }) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("watcher unavailable, auto-refresh disabled: {e}");
                None
            }
        }
    };

    // Initial build, bypassing the quiet period.
    debounce.immediate()?;

    run_driver(&handle).await
}

/// Minimal stand-in for the window: each input line runs one search and
/// prints the selected path. A leading `/` switches to content-regex mode.
async fn run_driver(handle: &EngineHandle) -> error::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let (pattern, mode) = match input.strip_prefix('/') {
            Some(rest) => (rest, SearchMode::Content),
            None => (strip_position(input), SearchMode::Name),
        };
        match handle.search(pattern, mode).await {
            Ok(SearchOutcome::Found(m)) => match m.position {
                Some(pos) => println!("{}:{}:{}", m.path, pos.row, pos.column),
                None => println!("{}", m.path),
            },
            Ok(SearchOutcome::NoMatch) => println!("no match"),
            Ok(SearchOutcome::Cancelled) => {}
            Err(AppError::InvalidPattern(e)) => eprintln!("not searchable: {e}"),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Strip a ":row:col" tail from inputs like "main.rs:10:4".
fn strip_position(input: &str) -> &str {
    input.split(':').next().unwrap_or(input)
}
