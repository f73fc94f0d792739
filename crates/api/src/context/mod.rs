//! Application context - dependency injection container

use std::sync::Arc;

use questlog_common::{Clock, SystemClock};
use questlog_core::{
    CalendarSync, ProgressRepository, ProgressionService, ProgressionSettings, TaskRepository,
    TaskService,
};
use questlog_domain::{Config, Result, StorageBackend};
use questlog_infra::{
    DbManager, GoogleCalendarSync, MemoryStore, SqliteProgressRepository, SqliteTaskRepository,
};
use tracing::{info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Store adapters chosen by configuration
pub struct Stores {
    pub tasks: Arc<dyn TaskRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    /// Set when the stores are SQLite-backed.
    pub db: Option<Arc<DbManager>>,
}

impl Stores {
    /// Open the backend named in `config`.
    ///
    /// # Errors
    /// Any failure opening or migrating the SQLite database.
    pub fn open(config: &Config) -> Result<Self> {
        match config.database.backend {
            StorageBackend::Sqlite => {
                let db = Arc::new(DbManager::from_config(&config.database)?);
                Ok(Self {
                    tasks: Arc::new(SqliteTaskRepository::new(Arc::clone(&db))),
                    progress: Arc::new(SqliteProgressRepository::new(Arc::clone(&db))),
                    db: Some(db),
                })
            }
            StorageBackend::Memory => Ok(Self::in_memory()),
        }
    }

    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self { tasks: Arc::new(store.clone()), progress: Arc::new(store), db: None }
    }
}

/// Application context - holds the services shared by all request handlers
pub struct AppContext {
    pub config: Config,
    pub tasks: Arc<TaskService>,
    db: Option<Arc<DbManager>>,
    calendar_enabled: bool,
}

impl AppContext {
    /// Build the context from configuration using the system clock.
    ///
    /// # Errors
    /// Storage or calendar setup failures.
    pub fn new(config: Config) -> Result<Self> {
        let stores = Stores::open(&config)?;
        let calendar = GoogleCalendarSync::from_config(&config.calendar)?
            .map(|sync| Arc::new(sync) as Arc<dyn CalendarSync>);
        Ok(Self::from_parts(config, stores, Arc::new(SystemClock), calendar))
    }

    /// Assemble a context from already constructed adapters.
    pub fn from_parts(
        config: Config,
        stores: Stores,
        clock: Arc<dyn Clock>,
        calendar: Option<Arc<dyn CalendarSync>>,
    ) -> Self {
        let settings = ProgressionSettings::from(&config.progression);
        let progression = Arc::new(ProgressionService::new(
            Arc::clone(&stores.tasks),
            Arc::clone(&stores.progress),
            Arc::clone(&clock),
            settings,
        ));

        let calendar_enabled = calendar.is_some();
        let mut tasks = TaskService::new(Arc::clone(&stores.tasks), progression, clock);
        if let Some(calendar) = calendar {
            tasks = tasks.with_calendar(calendar);
        }

        info!(
            backend = %config.database.backend,
            xp_formula = %settings.xp_formula,
            calendar_enabled,
            "application context ready"
        );
        if config.database.backend == StorageBackend::Memory {
            warn!("memory backend selected, progress will not survive a restart");
        }

        Self { config, tasks: Arc::new(tasks), db: stores.db, calendar_enabled }
    }

    /// Check every dependency the handlers rely on.
    pub async fn health_check(&self) -> HealthStatus {
        let storage = match &self.db {
            Some(db) => {
                let db = Arc::clone(db);
                match tokio::task::spawn_blocking(move || db.health_check()).await {
                    Ok(Ok(())) => ComponentHealth::healthy("storage"),
                    Ok(Err(err)) => ComponentHealth::unhealthy("storage", err.to_string()),
                    Err(err) => ComponentHealth::unhealthy("storage", err.to_string()),
                }
            }
            None => ComponentHealth::healthy_with("storage", "in-memory, not persisted"),
        };

        let calendar = if self.calendar_enabled {
            ComponentHealth::healthy_with("calendar", "sync enabled")
        } else {
            ComponentHealth::healthy_with("calendar", "sync disabled")
        };

        HealthStatus::new(chrono::Utc::now()).add_component(storage).add_component(calendar)
    }
}
