use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

/// Highest declared port accepted; 0 means "not locally runnable"
pub const MAX_PORT: i64 = 65535;

/// A microservice discovered inside a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub repo_id: i64,
    pub service_key: String, // natural key within the repository
    pub name: String,
    pub port: i32,
    pub directory: String,   // directory name under `services/`
    pub config_json: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Input for both plain creation and upsert-by-natural-key
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertService {
    pub service_key: String,
    pub name: String,
    pub port: i64,
    pub directory: String,
    pub config_json: String,
}

impl UpsertService {
    pub fn validate(&self) -> AppResult<()> {
        if self.service_key.is_empty() {
            return Err(AppError::Validation("service_id cannot be empty".to_string()));
        }
        if self.name.is_empty() {
            return Err(AppError::Validation(
                "service name cannot be empty".to_string(),
            ));
        }
        validate_port(self.port)?;
        Ok(())
    }
}

pub fn validate_port(port: i64) -> AppResult<i32> {
    if !(0..=MAX_PORT).contains(&port) {
        return Err(AppError::Validation(
            "port must be between 0 and 65535".to_string(),
        ));
    }
    Ok(port as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_bounds() {
        assert_eq!(validate_port(0).unwrap(), 0);
        assert_eq!(validate_port(65535).unwrap(), 65535);
        assert!(validate_port(65536).is_err());
        assert!(validate_port(-1).is_err());
    }
}
