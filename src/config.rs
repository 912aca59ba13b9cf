use std::env;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Database path selecting a private in-memory database
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub db_path: String,

    // Request executor
    pub request_timeout: Duration,

    // History
    pub history_limit: u64,

    // Logging
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        let db_path = match env::var("POSTWHALE_DB_PATH") {
            Ok(path) => path,
            Err(_) => default_db_path()?,
        };
        validate_db_path(&db_path)?;

        Ok(Self {
            db_path,
            request_timeout: Duration::from_secs(parse_positive(
                "POSTWHALE_REQUEST_TIMEOUT_SECS",
                30,
            )?),
            history_limit: parse_positive("POSTWHALE_HISTORY_LIMIT", 50)?,
            log_format: match env::var("POSTWHALE_LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase()
                .as_str()
            {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::Invalid("POSTWHALE_LOG_FORMAT")),
            },
        })
    }

    /// Configuration backed by a private in-memory database (tests, dry runs)
    pub fn in_memory() -> Self {
        Self {
            db_path: IN_MEMORY_DB.to_string(),
            request_timeout: Duration::from_secs(30),
            history_limit: 50,
            log_format: LogFormat::Text,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}

/// Current user's home directory (`HOME`, or `USERPROFILE` on Windows)
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

/// `$HOME/.postwhale/postwhale.db`
fn default_db_path() -> Result<String, ConfigError> {
    let home = home_dir().ok_or(ConfigError::Missing("HOME"))?;

    Ok(home
        .join(".postwhale")
        .join("postwhale.db")
        .to_string_lossy()
        .into_owned())
}

fn validate_db_path(path: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::Invalid("POSTWHALE_DB_PATH"));
    }
    if Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ConfigError::Invalid("POSTWHALE_DB_PATH"));
    }
    Ok(())
}

fn parse_positive(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}
