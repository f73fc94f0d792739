//! Conversions from external infrastructure errors into domain errors.

use questlog_common::StorageError;
use questlog_domain::QuestlogError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub QuestlogError);

impl From<InfraError> for QuestlogError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<QuestlogError> for InfraError {
    fn from(value: QuestlogError) -> Self {
        Self(value)
    }
}

trait IntoQuestlogError {
    fn into_questlog(self) -> QuestlogError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → QuestlogError */
/* -------------------------------------------------------------------------- */

impl IntoQuestlogError for SqlError {
    fn into_questlog(self) -> QuestlogError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        QuestlogError::Persistence("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        QuestlogError::Persistence("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        QuestlogError::Persistence("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        QuestlogError::Persistence("foreign key constraint violation".into())
                    }
                    _ => QuestlogError::Persistence(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => QuestlogError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                QuestlogError::Persistence(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                QuestlogError::Persistence(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => QuestlogError::Persistence(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => QuestlogError::Persistence(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_questlog())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → QuestlogError */
/* -------------------------------------------------------------------------- */

impl IntoQuestlogError for StorageError {
    fn into_questlog(self) -> QuestlogError {
        match self {
            StorageError::Rusqlite(err) => err.into_questlog(),
            StorageError::InvalidConfig(message) => QuestlogError::Config(message),
            other => QuestlogError::Persistence(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        Self(value.into_questlog())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → QuestlogError */
/* -------------------------------------------------------------------------- */

impl IntoQuestlogError for HttpError {
    fn into_questlog(self) -> QuestlogError {
        if self.is_timeout() {
            return QuestlogError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return QuestlogError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => QuestlogError::SyncFailure(message),
                404 => QuestlogError::NotFound(message),
                _ => QuestlogError::Network(message),
            };
        }

        QuestlogError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_questlog())
    }
}

/* -------------------------------------------------------------------------- */
/* JoinError → QuestlogError */
/* -------------------------------------------------------------------------- */

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        Self(QuestlogError::Internal(format!("blocking task failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
