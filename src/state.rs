use std::str::FromStr;

use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::config::Config;
use crate::services::RequestExecutor;

/// Application state shared by every action handler
#[derive(Clone)]
pub struct AppState {
    /// SeaORM connection over a single-connection SQLite pool
    pub db: DatabaseConnection,
    pub config: Config,
    pub executor: RequestExecutor,
}

impl AppState {
    /// Open the database, run migrations and build the HTTP executor
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        let options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| AppStateError::Database(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.db_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        }
        .foreign_keys(true);

        // One long-lived connection: an in-memory database lives and dies with it,
        // and every action runs to completion before the next is read
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppStateError::Database(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppStateError::Migration(e.to_string()))?;

        let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);

        let executor = RequestExecutor::new(config.request_timeout)
            .map_err(|e| AppStateError::HttpClient(e.to_string()))?;

        Ok(Self {
            db,
            config,
            executor,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("SQLite connection error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
