use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::common::timestamp;
use crate::models::Service;
use crate::state::AppState;
use crate::store::ServiceStore;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetServicesRequest {
    pub repository_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: i64,
    pub repo_id: i64,
    /// Natural key from the service's config
    pub service_id: String,
    pub name: String,
    pub port: i32,
    pub directory: String,
    pub config: serde_json::Value,
    pub updated_at: String,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        let config = serde_json::from_str(&s.config_json).unwrap_or(serde_json::Value::Null);

        Self {
            id: s.id,
            repo_id: s.repo_id,
            service_id: s.service_key,
            name: s.name,
            port: s.port,
            directory: s.directory,
            config,
            updated_at: timestamp(s.updated_at),
        }
    }
}

// ============ Handlers ============

/// Services of one repository; an unknown id yields an empty list
pub async fn get_services(
    state: &AppState,
    payload: GetServicesRequest,
) -> AppResult<Vec<ServiceResponse>> {
    let services = ServiceStore::list_by_repository(&state.db, payload.repository_id).await?;
    Ok(services.into_iter().map(|s| s.into()).collect())
}
