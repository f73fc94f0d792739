//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_MAX_CONFLICT_RETRIES, DEFAULT_STREAK_GRACE_DAYS,
};
use crate::impl_domain_enum_conversions;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub progression: ProgressionConfig,
    pub calendar: CalendarConfig,
    pub logging: LoggingConfig,
}

/// Which store implementation backs tasks and progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Non-persistent fallback, state is lost on restart.
    Memory,
}

impl_domain_enum_conversions!(StorageBackend {
    Sqlite => "sqlite",
    Memory => "memory",
});

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub path: String,
    pub pool_size: u32,
    /// How long a progress commit waits for another writer's lock.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: "questlog.db".to_string(),
            pool_size: 8,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

/// Formula used to price a task completion in XP
///
/// Exactly one formula is active per process. Reversal subtracts the stored
/// grant, so switching formulas never unbalances existing completions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpFormula {
    /// `priority_weight * 10 + duration_minutes / 30`
    #[default]
    PriorityDuration,
    /// `round(duration_minutes / 30 * 10 * category_multiplier)`
    CategoryDuration,
}

impl_domain_enum_conversions!(XpFormula {
    PriorityDuration => "priority_duration",
    CategoryDuration => "category_duration",
});

/// Progression engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub xp_formula: XpFormula,
    /// Days after the last completion that a streak stays alive. `0` (the
    /// default) requires a completion today.
    pub streak_grace_days: u32,
    /// Extra attempts after an optimistic-concurrency conflict.
    pub max_conflict_retries: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_formula: XpFormula::PriorityDuration,
            streak_grace_days: DEFAULT_STREAK_GRACE_DAYS,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// Google Calendar sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub enabled: bool,
    pub calendar_id: String,
    pub api_base: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            calendar_id: "primary".to_string(),
            api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            access_token: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
