use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

/// A filesystem root registered by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub path: String,   // absolute, unique
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRepository {
    pub name: String,
    pub path: String,
}

impl CreateRepository {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_empty() {
            return Err(AppError::Validation(
                "repository name cannot be empty".to_string(),
            ));
        }
        if self.path.is_empty() {
            return Err(AppError::Validation(
                "repository path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
