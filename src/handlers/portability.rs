use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::services::portability::{self, ExportResult, ImportResult};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePortabilityRequest {
    pub service_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPortabilityRequest {
    pub repository_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub file_path: Option<String>,
    pub count: usize,
}

impl From<ExportResult> for ExportResponse {
    fn from(r: ExportResult) -> Self {
        Self {
            file_path: r.file_path.map(|p| p.to_string_lossy().into_owned()),
            count: r.count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceExportResponse {
    pub service_id: String,
    pub file_path: Option<String>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub added: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl From<ImportResult> for ImportResponse {
    fn from(r: ImportResult) -> Self {
        Self {
            added: r.added,
            replaced: r.replaced,
            skipped: r.skipped,
            errors: r.errors,
        }
    }
}

// ============ Handlers ============

pub async fn export_saved_requests(
    state: &AppState,
    payload: ServicePortabilityRequest,
) -> AppResult<ExportResponse> {
    let result = portability::export_service(&state.db, payload.service_id).await?;
    Ok(result.into())
}

pub async fn import_saved_requests(
    state: &AppState,
    payload: ServicePortabilityRequest,
) -> AppResult<ImportResponse> {
    let result = portability::import_service(&state.db, payload.service_id).await?;
    Ok(result.into())
}

pub async fn export_repository_saved_requests(
    state: &AppState,
    payload: RepositoryPortabilityRequest,
) -> AppResult<Vec<ServiceExportResponse>> {
    let exports = portability::export_repository(&state.db, payload.repository_id).await?;

    Ok(exports
        .into_iter()
        .map(|export| match export.result {
            Ok(result) => ServiceExportResponse {
                service_id: export.service_key,
                file_path: result.file_path.map(|p| p.to_string_lossy().into_owned()),
                count: result.count,
                error: None,
            },
            Err(error) => ServiceExportResponse {
                service_id: export.service_key,
                file_path: None,
                count: 0,
                error: Some(error),
            },
        })
        .collect())
}

pub async fn import_repository_saved_requests(
    state: &AppState,
    payload: RepositoryPortabilityRequest,
) -> AppResult<BTreeMap<String, ImportResponse>> {
    let results = portability::import_repository(&state.db, payload.repository_id).await?;
    Ok(results.into_iter().map(|(k, v)| (k, v.into())).collect())
}
