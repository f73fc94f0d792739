//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Read a `.env` file into the process environment if one exists
//! 2. Attempt to load from environment variables
//! 3. If `QUESTLOG_DB_PATH` is unset, fall back to a config file
//! 4. If no config file exists either, use the built-in defaults
//!
//! ## Environment Variables
//! - `QUESTLOG_DB_PATH`: Database file path (required for env loading)
//! - `QUESTLOG_DB_BACKEND`: `sqlite` or `memory`
//! - `QUESTLOG_DB_POOL_SIZE`: Connection pool size
//! - `QUESTLOG_DB_BUSY_TIMEOUT_MS`: Wait for a competing writer, in milliseconds
//! - `QUESTLOG_SERVER_HOST` / `QUESTLOG_SERVER_PORT`: HTTP bind address
//! - `QUESTLOG_XP_FORMULA`: `priority_duration` or `category_duration`
//! - `QUESTLOG_STREAK_GRACE_DAYS`: Days a streak survives without activity
//! - `QUESTLOG_MAX_CONFLICT_RETRIES`: Retries after a version conflict
//! - `QUESTLOG_CALENDAR_ENABLED`: Whether calendar sync is on (true/false)
//! - `QUESTLOG_CALENDAR_ID`, `QUESTLOG_CALENDAR_API_BASE`,
//!   `QUESTLOG_CALENDAR_ACCESS_TOKEN`: Calendar target and credentials
//! - `QUESTLOG_LOG_LEVEL`, `QUESTLOG_LOG_JSON`: Logging filter and format
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `questlog.{json,toml}` in the
//! working directory, its parent, and next to the executable.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use questlog_domain::{Config, QuestlogError, Result};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `QuestlogError::Config` when an environment value or the config
/// file that was found is invalid.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    if std::env::var_os("QUESTLOG_DB_PATH").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No configuration found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `QUESTLOG_DB_PATH` is required; every other variable falls back to its
/// default when unset.
///
/// # Errors
/// Returns `QuestlogError::Config` if the path is missing or a variable
/// holds an unparsable value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("QUESTLOG_DB_PATH")?;
    if let Some(backend) = env_parse("QUESTLOG_DB_BACKEND")? {
        config.database.backend = backend;
    }
    if let Some(size) = env_parse("QUESTLOG_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }
    if let Some(timeout) = env_parse("QUESTLOG_DB_BUSY_TIMEOUT_MS")? {
        config.database.busy_timeout_ms = timeout;
    }

    if let Ok(host) = std::env::var("QUESTLOG_SERVER_HOST") {
        config.server.host = host;
    }
    if let Some(port) = env_parse("QUESTLOG_SERVER_PORT")? {
        config.server.port = port;
    }

    if let Some(formula) = env_parse("QUESTLOG_XP_FORMULA")? {
        config.progression.xp_formula = formula;
    }
    if let Some(days) = env_parse("QUESTLOG_STREAK_GRACE_DAYS")? {
        config.progression.streak_grace_days = days;
    }
    if let Some(retries) = env_parse("QUESTLOG_MAX_CONFLICT_RETRIES")? {
        config.progression.max_conflict_retries = retries;
    }

    config.calendar.enabled = env_bool("QUESTLOG_CALENDAR_ENABLED", config.calendar.enabled);
    if let Ok(id) = std::env::var("QUESTLOG_CALENDAR_ID") {
        config.calendar.calendar_id = id;
    }
    if let Ok(base) = std::env::var("QUESTLOG_CALENDAR_API_BASE") {
        config.calendar.api_base = base;
    }
    config.calendar.access_token = std::env::var("QUESTLOG_CALENDAR_ACCESS_TOKEN").ok();

    if let Ok(level) = std::env::var("QUESTLOG_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("QUESTLOG_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. JSON and TOML are
/// supported, detected by file extension; sections left out of the file
/// take their defaults.
///
/// # Errors
/// Returns `QuestlogError::Config` if the file is missing, unreadable, or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(QuestlogError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            QuestlogError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| QuestlogError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| QuestlogError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| QuestlogError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(QuestlogError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// Returns the first existing candidate, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "questlog.json", "questlog.toml"];

    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join("..")]);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        QuestlogError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable, `None` when unset.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| QuestlogError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
