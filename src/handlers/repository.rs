use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::common::timestamp;
use crate::handlers::filesystem::resolve_user_path;
use crate::models::{CreateRepository, Repository};
use crate::services::reconciler;
use crate::state::AppState;
use crate::store::{RepositoryStore, Store};

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize)]
pub struct AddRepositoryRequest {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryIdRequest {
    pub id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryResponse {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub created_at: String,
}

impl From<Repository> for RepositoryResponse {
    fn from(r: Repository) -> Self {
        Self {
            id: r.id,
            name: r.name,
            path: r.path,
            created_at: timestamp(r.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRepositoryResponse {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub services_added: usize,
    pub endpoints_added: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRepositoryResponse {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub services_added: usize,
    pub endpoints_added: usize,
    pub services_removed: usize,
    pub endpoints_removed: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

// ============ Handlers ============

/// Register a repository root and persist everything discovered under it
pub async fn add_repository(
    state: &AppState,
    payload: AddRepositoryRequest,
) -> AppResult<AddRepositoryResponse> {
    if payload.path.trim().is_empty() {
        return Err(AppError::Validation(
            "repository path cannot be empty".to_string(),
        ));
    }

    let path = resolve_user_path(payload.path.trim())?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let input = CreateRepository {
        name,
        path: path.to_string_lossy().into_owned(),
    };

    let (repository, report) = reconciler::add_repository(&state.db, &input).await?;

    let mut warnings = report.warnings;
    warnings.extend(report.errors);

    Ok(AddRepositoryResponse {
        id: repository.id,
        name: repository.name,
        path: repository.path,
        services_added: report.services_touched,
        endpoints_added: report.endpoints_touched,
        warnings,
    })
}

/// All registered repositories, newest first
pub async fn get_repositories(state: &AppState) -> AppResult<Vec<RepositoryResponse>> {
    let repositories = RepositoryStore::list(&state.db).await?;
    Ok(repositories.into_iter().map(|r| r.into()).collect())
}

/// Delete a repository with everything under it
pub async fn remove_repository(
    state: &AppState,
    payload: RepositoryIdRequest,
) -> AppResult<RemovedResponse> {
    RepositoryStore::delete(&state.db, payload.id).await?;
    tracing::info!(repository_id = payload.id, "Repository removed");
    Ok(RemovedResponse { removed: true })
}

/// Re-scan a repository and reconcile its stored topology
pub async fn refresh_repository(
    state: &AppState,
    payload: RepositoryIdRequest,
) -> AppResult<RefreshRepositoryResponse> {
    let (repository, report) = reconciler::refresh_repository(&state.db, payload.id).await?;

    Ok(RefreshRepositoryResponse {
        id: repository.id,
        name: repository.name,
        path: repository.path,
        services_added: report.services_touched,
        endpoints_added: report.endpoints_touched,
        services_removed: report.services_removed,
        endpoints_removed: report.endpoints_removed,
        warnings: report.warnings,
        errors: report.errors,
    })
}
