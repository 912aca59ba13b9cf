use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

/// Immutable record of one executed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub endpoint_id: i64,
    pub environment: String,
    pub headers: String,  // serialized header map
    pub body: String,
    pub response: String, // serialized ExecutionResponse
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHistoryEntry {
    pub endpoint_id: i64,
    pub environment: String,
    pub headers: String,
    pub body: String,
    pub response: String,
}

impl CreateHistoryEntry {
    pub fn validate(&self) -> AppResult<()> {
        if self.environment.is_empty() {
            return Err(AppError::Validation("environment cannot be empty".to_string()));
        }
        if self.endpoint_id <= 0 {
            return Err(AppError::Validation("endpoint_id cannot be empty".to_string()));
        }
        Ok(())
    }
}
