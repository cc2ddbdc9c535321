//! # Illusion Bot Configuration System
//!
//! File: bot/src/core/config.rs
//!
//! ## Overview
//!
//! Loads, merges and validates the settings the game core needs: where the
//! stats database lives, how long a challenge stays answerable, how often the
//! expiry sweep runs, and how the persistence queue is sized.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.illusion-bot.toml` in the current directory or ancestors
//! 2. User-specific `config.toml` in the platform config directory
//! 3. Default values defined in the code
//!
//! After merging, `~` in the data directory is expanded and the result is
//! validated before anything opens the database.
//!
//! ## Examples
//!
//! ```toml
//! [storage]
//! data_dir = "~/.local/share/illusion-bot"
//!
//! [challenges]
//! timeout_secs = 600
//! cleanup_interval_secs = 60
//!
//! [persistence]
//! queue_capacity = 256
//!
//! [leaderboard]
//! default_limit = 10
//! ```
//!
use crate::core::error::{GameError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, warn};

/// Resolved configuration: defaults with the user and project files layered on top.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageConfig,
    pub challenges: ChallengeConfig,
    pub persistence: PersistenceConfig,
    pub leaderboard: LeaderboardConfig,
}

/// Where the durable stats table is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding the database (can use ~). Created on open.
    pub data_dir: String,
    /// File name of the SQLite database inside `data_dir`.
    pub database_file: String,
}

/// Challenge lifetime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeConfig {
    /// Age in seconds after which a challenge is treated as gone.
    pub timeout_secs: u64,
    /// Seconds between background expiry sweeps.
    pub cleanup_interval_secs: u64,
}

/// Background persistence settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Maximum number of pending upserts before `record_answer` waits.
    pub queue_capacity: usize,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardConfig {
    /// Number of entries shown when the caller gives no limit.
    pub default_limit: usize,
}

/// One configuration file as written. Every key is optional; only the keys
/// present override the layer below.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    storage: StorageFile,
    #[serde(default)]
    challenges: ChallengeFile,
    #[serde(default)]
    persistence: PersistenceFile,
    #[serde(default)]
    leaderboard: LeaderboardFile,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct StorageFile {
    data_dir: Option<String>,
    database_file: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ChallengeFile {
    timeout_secs: Option<u64>,
    cleanup_interval_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PersistenceFile {
    queue_capacity: Option<usize>,
    busy_timeout_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct LeaderboardFile {
    default_limit: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_limit: default_leaderboard_limit(),
        }
    }
}

impl StorageConfig {
    /// Full path of the stats database.
    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.database_file)
    }
}

impl ChallengeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl PersistenceConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}
fn default_database_file() -> String {
    "user_stats.db".to_string()
}
fn default_timeout_secs() -> u64 {
    600
}
fn default_cleanup_interval_secs() -> u64 {
    60
}
fn default_queue_capacity() -> usize {
    256
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}
fn default_leaderboard_limit() -> usize {
    10
}

const PROJECT_CONFIG_FILENAME: &str = ".illusion-bot.toml";

/// Upper bound on the challenge timeout (one day).
const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Loads the merged, expanded and validated configuration.
///
/// `data_dir_override` (from `--data-dir` or `ILLUSION_BOT_DATA_DIR`) wins over
/// every file source.
pub fn load_config(data_dir_override: Option<&Path>) -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config, project_config);
    if let Some(dir) = data_dir_override {
        debug!("Data directory overridden to {}", dir.display());
        merged_config.storage.data_dir = dir.to_string_lossy().into_owned();
    }
    expand_config_paths(&mut merged_config);
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<ConfigFile>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "IllusionBot", "illusion-bot") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<ConfigFile>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file ({PROJECT_CONFIG_FILENAME}) found.");
        Ok(None)
    }
}

/// Walks up from `start` looking for the project file, stopping at a `.git` directory.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(PROJECT_CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                dir.display()
            );
            return None;
        }
    }
    None
}

fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Layers the user file, then the project file, over the defaults.
///
/// A key present in a file always wins over the layers below it, even when
/// it repeats the default value.
fn merge_configs(user: Option<ConfigFile>, project: Option<ConfigFile>) -> Config {
    let mut config = Config::default();
    for file in [user, project].into_iter().flatten() {
        apply_file(&mut config, file);
    }
    config
}

fn apply_file(config: &mut Config, file: ConfigFile) {
    let storage = &mut config.storage;
    set(&mut storage.data_dir, file.storage.data_dir);
    set(&mut storage.database_file, file.storage.database_file);

    let challenges = &mut config.challenges;
    set(&mut challenges.timeout_secs, file.challenges.timeout_secs);
    set(
        &mut challenges.cleanup_interval_secs,
        file.challenges.cleanup_interval_secs,
    );

    let persistence = &mut config.persistence;
    set(
        &mut persistence.queue_capacity,
        file.persistence.queue_capacity,
    );
    set(
        &mut persistence.busy_timeout_ms,
        file.persistence.busy_timeout_ms,
    );

    let leaderboard = &mut config.leaderboard;
    set(
        &mut leaderboard.default_limit,
        file.leaderboard.default_limit,
    );
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn expand_config_paths(config: &mut Config) {
    config.storage.data_dir = shellexpand::tilde(&config.storage.data_dir).into_owned();
    debug!("Expanded data directory: {}", config.storage.data_dir);
}

fn validate_config(config: &Config) -> Result<()> {
    debug!("Validating final configuration...");
    if config.storage.data_dir.trim().is_empty() {
        return Err(anyhow!(GameError::Config(
            "storage.data_dir cannot be empty.".to_string()
        )));
    }
    let db_file = &config.storage.database_file;
    if db_file.trim().is_empty() || db_file.contains(['/', '\\']) {
        return Err(anyhow!(GameError::Config(format!(
            "Invalid storage.database_file '{}'. Expected a plain file name.",
            db_file
        ))));
    }
    let data_dir = Path::new(&config.storage.data_dir);
    if data_dir.exists() && !data_dir.is_dir() {
        return Err(anyhow!(GameError::Config(format!(
            "Configured data path '{}' exists but is not a directory.",
            data_dir.display()
        ))));
    }
    if config.challenges.timeout_secs == 0 || config.challenges.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(anyhow!(GameError::Config(format!(
            "challenges.timeout_secs must be between 1 and {}, got {}.",
            MAX_TIMEOUT_SECS, config.challenges.timeout_secs
        ))));
    }
    if config.challenges.cleanup_interval_secs == 0 {
        return Err(anyhow!(GameError::Config(
            "challenges.cleanup_interval_secs must be positive.".to_string()
        )));
    }
    if config.persistence.queue_capacity == 0 {
        return Err(anyhow!(GameError::Config(
            "persistence.queue_capacity must be positive.".to_string()
        )));
    }
    if config.leaderboard.default_limit == 0 {
        return Err(anyhow!(GameError::Config(
            "leaderboard.default_limit must be positive.".to_string()
        )));
    }
    info!("Configuration validation successful.");
    Ok(())
}
