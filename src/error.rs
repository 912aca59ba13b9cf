use serde::Serialize;

/// Application error type returned by every store operation and action handler
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    // Validation errors (bad field, bad enum value, path traversal)
    #[error("{0}")]
    Validation(String),

    // Repository-level discovery failure (missing root, missing services dir)
    #[error("scan failed: {0}")]
    Scan(String),

    // Database errors
    #[error("database error: {0}")]
    Database(String),

    // Malformed payloads and persisted blobs
    #[error("serialization error: {0}")]
    Serialization(String),

    // Filesystem errors
    #[error("io error: {0}")]
    Io(String),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-friendly category, used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "validation",
            AppError::Scan(_) => "scan",
            AppError::Database(_) => "database",
            AppError::Serialization(_) => "serialization",
            AppError::Io(_) => "io",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Error body carried back through the gateway
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Database(msg) => tracing::error!("Database error: {}", msg),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            _ => {}
        }

        Self {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

// Convenient conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource".to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(format!("migration failed: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::RecordNotFound(_) => AppError::NotFound("Resource".to_string()),
            sea_orm::DbErr::RecordNotInserted => {
                AppError::Conflict("Record".to_string())
            }
            sea_orm::DbErr::RecordNotUpdated => AppError::NotFound("Resource".to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

/// Result type alias for store operations and handlers
pub type AppResult<T> = Result<T, AppError>;
