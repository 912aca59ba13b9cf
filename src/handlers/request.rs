use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::common::timestamp;
use crate::models::{CreateHistoryEntry, HistoryEntry};
use crate::services::{Environment, ExecutionResponse, RequestConfig};
use crate::state::AppState;
use crate::store::HistoryStore;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequestRequest {
    /// Natural key of the target service
    pub service_id: String,
    /// Accepted for compatibility; routing goes through the local proxy
    #[serde(default)]
    pub port: Option<i64>,
    pub endpoint: String,
    pub method: String,
    pub environment: Environment,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
    /// When positive, the call is recorded in this endpoint's history
    #[serde(default)]
    pub endpoint_id: i64,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRequestHistoryRequest {
    pub endpoint_id: i64,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub id: i64,
    pub endpoint_id: i64,
    pub environment: String,
    pub headers: String,
    pub body: String,
    pub response: String,
    pub created_at: String,
}

impl From<HistoryEntry> for HistoryEntryResponse {
    fn from(h: HistoryEntry) -> Self {
        Self {
            id: h.id,
            endpoint_id: h.endpoint_id,
            environment: h.environment,
            headers: h.headers,
            body: h.body,
            response: h.response,
            created_at: timestamp(h.created_at),
        }
    }
}

// ============ Handlers ============

/// Perform one live call; transport failures come back inside the response
pub async fn execute_request(
    state: &AppState,
    payload: ExecuteRequestRequest,
) -> AppResult<ExecutionResponse> {
    let config = RequestConfig {
        service_id: payload.service_id,
        endpoint: payload.endpoint,
        method: payload.method,
        environment: payload.environment,
        headers: payload.headers,
        body: payload.body,
        timeout: payload
            .timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis),
    };

    let response = state.executor.execute(&config).await;

    if payload.endpoint_id > 0 {
        record_history(state, payload.endpoint_id, &config, &response).await;
    }

    Ok(response)
}

/// Most recent calls of an endpoint, newest first
pub async fn get_request_history(
    state: &AppState,
    payload: GetRequestHistoryRequest,
) -> AppResult<Vec<HistoryEntryResponse>> {
    let limit = match payload.limit {
        Some(limit) if limit > 0 => limit as u64,
        _ => state.config.history_limit,
    };

    let history = HistoryStore::list_by_endpoint(&state.db, payload.endpoint_id, limit).await?;
    Ok(history.into_iter().map(|h| h.into()).collect())
}

/// History is best effort: a failed write never fails the call itself
async fn record_history(
    state: &AppState,
    endpoint_id: i64,
    config: &RequestConfig,
    response: &ExecutionResponse,
) {
    if let Err(e) = append_history(state, endpoint_id, config, response).await {
        tracing::warn!(endpoint_id, error = %e, "Failed to record request history");
    }
}

async fn append_history(
    state: &AppState,
    endpoint_id: i64,
    config: &RequestConfig,
    response: &ExecutionResponse,
) -> AppResult<()> {
    let entry = CreateHistoryEntry {
        endpoint_id,
        environment: config.environment.as_str().to_string(),
        headers: serde_json::to_string(&config.headers)?,
        body: config.body.clone(),
        response: serde_json::to_string(response)?,
    };

    HistoryStore::append(&state.db, &entry).await?;
    Ok(())
}
