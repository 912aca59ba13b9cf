use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

/// Named parameter preset for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRequest {
    pub id: i64,
    pub endpoint_id: i64,
    pub name: String,
    pub path_params_json: String,  // {"name": "value"}
    pub query_params_json: String, // [{"key", "value", "enabled"}]
    pub headers_json: String,      // [{"key", "value", "enabled"}]
    pub body: String,
    pub created_at: OffsetDateTime,
}

/// Saved request joined with its endpoint's natural key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRequestWithEndpoint {
    pub saved_request: SavedRequest,
    pub method: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSavedRequest {
    pub endpoint_id: i64,
    pub name: String,
    pub path_params_json: String,
    pub query_params_json: String,
    pub headers_json: String,
    pub body: String,
}

impl CreateSavedRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_empty() {
            return Err(AppError::Validation(
                "saved request name cannot be empty".to_string(),
            ));
        }
        if self.endpoint_id <= 0 {
            return Err(AppError::Validation("endpoint_id cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSavedRequest {
    pub id: i64,
    pub name: String,
    pub path_params_json: String,
    pub query_params_json: String,
    pub headers_json: String,
    pub body: String,
}

impl UpdateSavedRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.id <= 0 {
            return Err(AppError::Validation(
                "saved request id cannot be empty".to_string(),
            ));
        }
        if self.name.is_empty() {
            return Err(AppError::Validation(
                "saved request name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Blob defaults used when a caller leaves a parameter field empty
pub const EMPTY_PATH_PARAMS: &str = "{}";
pub const EMPTY_PARAM_LIST: &str = "[]";

/// Replace an empty serialized blob with its canonical empty value
pub fn or_default_blob(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}
