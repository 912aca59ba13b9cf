use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::Endpoint;
use crate::state::AppState;
use crate::store::EndpointStore;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEndpointsRequest {
    pub service_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointResponse {
    pub id: i64,
    pub service_id: i64,
    pub operation_id: String,
    pub method: String,
    pub path: String,
    /// Parameters, request body and responses from the OpenAPI document
    pub spec: serde_json::Value,
}

impl From<Endpoint> for EndpointResponse {
    fn from(e: Endpoint) -> Self {
        let spec = serde_json::from_str(&e.spec_json).unwrap_or(serde_json::Value::Null);

        Self {
            id: e.id,
            service_id: e.service_id,
            operation_id: e.operation_id,
            method: e.method,
            path: e.path,
            spec,
        }
    }
}

// ============ Handlers ============

/// Endpoints of one service
pub async fn get_endpoints(
    state: &AppState,
    payload: GetEndpointsRequest,
) -> AppResult<Vec<EndpointResponse>> {
    let endpoints = EndpointStore::list_by_service(&state.db, payload.service_id).await?;
    Ok(endpoints.into_iter().map(|e| e.into()).collect())
}
