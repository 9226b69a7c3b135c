//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--no-watcher`)
//! 2. `$FNAV_CONFIG` environment variable (path to config file)
//! 3. Project-local `.fnav.toml` in the current working directory
//! 4. Global `~/.config/fnav/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root directory to navigate (overridden by the CLI positional arg).
    pub default_path: Option<String>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Enable the filesystem watcher for auto-refresh.
    pub enabled: Option<bool>,
    /// Quiet period in milliseconds before a burst of changes triggers a
    /// rebuild.
    pub quiet_ms: Option<u64>,
    /// Ignore change/delete events for names not in the last-known tree.
    pub strict: Option<bool>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub watcher: WatcherConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default quiet period before a rebuild, in milliseconds.
pub const DEFAULT_QUIET_MS: u64 = 1000;

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path — that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. $FNAV_CONFIG environment variable
    if let Ok(env_path) = std::env::var("FNAV_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    // 2. Project-local `.fnav.toml` in CWD
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".fnav.toml"));
    }

    // 3. Global `~/.config/fnav/config.toml`
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("fnav").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: other
                    .general
                    .default_path
                    .clone()
                    .or(self.general.default_path),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                quiet_ms: other.watcher.quiet_ms.or(self.watcher.quiet_ms),
                strict: other.watcher.strict.or(self.watcher.strict),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    pub fn load(cli_config_path: Option<&Path>) -> AppConfig {
        // Start with built-in defaults (all None — the struct Default).
        let mut config = AppConfig::default();

        // Walk candidates in reverse so that highest-priority overwrites lower.
        let paths = candidate_paths();
        for path in paths.iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        // Explicit --config file has the highest priority.
        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether the watcher is enabled.
    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    /// Quiet period before a rebuild, in milliseconds.
    pub fn quiet_ms(&self) -> u64 {
        self.watcher.quiet_ms.unwrap_or(DEFAULT_QUIET_MS)
    }

    /// Whether strict event filtering is on.
    pub fn strict_events(&self) -> bool {
        self.watcher.strict.unwrap_or(false)
    }
}
