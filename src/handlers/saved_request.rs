use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::common::timestamp;
use crate::models::{CreateSavedRequest, SavedRequest, UpdateSavedRequest};
use crate::state::AppState;
use crate::store::{SavedRequestStore, Store};

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSavedRequestRequest {
    pub endpoint_id: i64,
    pub name: String,
    #[serde(default)]
    pub path_params_json: String,
    #[serde(default)]
    pub query_params_json: String,
    #[serde(default)]
    pub headers_json: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSavedRequestsRequest {
    pub endpoint_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSavedRequestRequest {
    pub id: i64,
    /// Sent by the UI; a preset never moves between endpoints
    #[serde(default)]
    pub endpoint_id: i64,
    pub name: String,
    #[serde(default)]
    pub path_params_json: String,
    #[serde(default)]
    pub query_params_json: String,
    #[serde(default)]
    pub headers_json: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSavedRequestRequest {
    pub id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRequestResponse {
    pub id: i64,
    pub endpoint_id: i64,
    pub name: String,
    pub path_params_json: String,
    pub query_params_json: String,
    pub headers_json: String,
    pub body: String,
    pub created_at: String,
}

impl From<SavedRequest> for SavedRequestResponse {
    fn from(s: SavedRequest) -> Self {
        Self {
            id: s.id,
            endpoint_id: s.endpoint_id,
            name: s.name,
            path_params_json: s.path_params_json,
            query_params_json: s.query_params_json,
            headers_json: s.headers_json,
            body: s.body,
            created_at: timestamp(s.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

// ============ Handlers ============

pub async fn save_saved_request(
    state: &AppState,
    payload: SaveSavedRequestRequest,
) -> AppResult<SavedRequestResponse> {
    let input = CreateSavedRequest {
        endpoint_id: payload.endpoint_id,
        name: payload.name,
        path_params_json: payload.path_params_json,
        query_params_json: payload.query_params_json,
        headers_json: payload.headers_json,
        body: payload.body,
    };

    let saved = SavedRequestStore::create(&state.db, &input).await?;
    Ok(saved.into())
}

pub async fn get_saved_requests(
    state: &AppState,
    payload: GetSavedRequestsRequest,
) -> AppResult<Vec<SavedRequestResponse>> {
    let saved = SavedRequestStore::list_by_endpoint(&state.db, payload.endpoint_id).await?;
    Ok(saved.into_iter().map(|s| s.into()).collect())
}

pub async fn update_saved_request(
    state: &AppState,
    payload: UpdateSavedRequestRequest,
) -> AppResult<SavedRequestResponse> {
    let input = UpdateSavedRequest {
        id: payload.id,
        name: payload.name,
        path_params_json: payload.path_params_json,
        query_params_json: payload.query_params_json,
        headers_json: payload.headers_json,
        body: payload.body,
    };

    let saved = SavedRequestStore::update(&state.db, &input).await?;
    Ok(saved.into())
}

pub async fn delete_saved_request(
    state: &AppState,
    payload: DeleteSavedRequestRequest,
) -> AppResult<DeletedResponse> {
    SavedRequestStore::delete(&state.db, payload.id).await?;
    Ok(DeletedResponse { deleted: true })
}
