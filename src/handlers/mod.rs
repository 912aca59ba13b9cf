pub mod common;
pub mod endpoint;
pub mod filesystem;
pub mod portability;
pub mod repository;
pub mod request;
pub mod saved_request;
pub mod service;

pub use common::{decode_payload, timestamp};
pub use endpoint::{get_endpoints, EndpointResponse, GetEndpointsRequest};
pub use filesystem::{
    check_path, resolve_user_path, scan_directory, CheckPathResponse, PathRequest,
    ScanDirectoryResponse,
};
pub use portability::{
    export_repository_saved_requests, export_saved_requests, import_repository_saved_requests,
    import_saved_requests, ExportResponse, ImportResponse, RepositoryPortabilityRequest,
    ServicePortabilityRequest,
};
pub use repository::{
    add_repository, get_repositories, refresh_repository, remove_repository,
    AddRepositoryRequest, AddRepositoryResponse, RefreshRepositoryResponse, RepositoryIdRequest,
    RepositoryResponse,
};
pub use request::{
    execute_request, get_request_history, ExecuteRequestRequest, GetRequestHistoryRequest,
    HistoryEntryResponse,
};
pub use saved_request::{
    delete_saved_request, get_saved_requests, save_saved_request, update_saved_request,
    DeleteSavedRequestRequest, GetSavedRequestsRequest, SaveSavedRequestRequest,
    SavedRequestResponse, UpdateSavedRequestRequest,
};
pub use service::{get_services, GetServicesRequest, ServiceResponse};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Every action the backend understands, with its decoded payload
#[derive(Debug)]
pub enum Action {
    AddRepository(AddRepositoryRequest),
    GetRepositories,
    RemoveRepository(RepositoryIdRequest),
    RefreshRepository(RepositoryIdRequest),
    GetServices(GetServicesRequest),
    GetEndpoints(GetEndpointsRequest),
    ExecuteRequest(ExecuteRequestRequest),
    GetRequestHistory(GetRequestHistoryRequest),
    ScanDirectory(PathRequest),
    CheckPath(PathRequest),
    SaveSavedRequest(SaveSavedRequestRequest),
    GetSavedRequests(GetSavedRequestsRequest),
    UpdateSavedRequest(UpdateSavedRequestRequest),
    DeleteSavedRequest(DeleteSavedRequestRequest),
    ExportSavedRequests(ServicePortabilityRequest),
    ImportSavedRequests(ServicePortabilityRequest),
    ExportRepositorySavedRequests(RepositoryPortabilityRequest),
    ImportRepositorySavedRequests(RepositoryPortabilityRequest),
}

impl Action {
    /// Resolve an action name and decode its payload.
    ///
    /// Fails before any side effect on an unknown name or a payload of the
    /// wrong shape.
    pub fn decode(name: &str, data: serde_json::Value) -> AppResult<Self> {
        let action = match name {
            "addRepository" => Action::AddRepository(decode_payload(data)?),
            "getRepositories" => Action::GetRepositories,
            "removeRepository" => Action::RemoveRepository(decode_payload(data)?),
            "refreshRepository" => Action::RefreshRepository(decode_payload(data)?),
            "getServices" => Action::GetServices(decode_payload(data)?),
            "getEndpoints" => Action::GetEndpoints(decode_payload(data)?),
            "executeRequest" => Action::ExecuteRequest(decode_payload(data)?),
            "getRequestHistory" => Action::GetRequestHistory(decode_payload(data)?),
            "scanDirectory" => Action::ScanDirectory(decode_payload(data)?),
            "checkPath" => Action::CheckPath(decode_payload(data)?),
            "saveSavedRequest" => Action::SaveSavedRequest(decode_payload(data)?),
            "getSavedRequests" => Action::GetSavedRequests(decode_payload(data)?),
            "updateSavedRequest" => Action::UpdateSavedRequest(decode_payload(data)?),
            "deleteSavedRequest" => Action::DeleteSavedRequest(decode_payload(data)?),
            "exportSavedRequests" => Action::ExportSavedRequests(decode_payload(data)?),
            "importSavedRequests" => Action::ImportSavedRequests(decode_payload(data)?),
            "exportRepositorySavedRequests" => {
                Action::ExportRepositorySavedRequests(decode_payload(data)?)
            }
            "importRepositorySavedRequests" => {
                Action::ImportRepositorySavedRequests(decode_payload(data)?)
            }
            other => return Err(AppError::Validation(format!("unknown action: {}", other))),
        };

        Ok(action)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::AddRepository(_) => "addRepository",
            Action::GetRepositories => "getRepositories",
            Action::RemoveRepository(_) => "removeRepository",
            Action::RefreshRepository(_) => "refreshRepository",
            Action::GetServices(_) => "getServices",
            Action::GetEndpoints(_) => "getEndpoints",
            Action::ExecuteRequest(_) => "executeRequest",
            Action::GetRequestHistory(_) => "getRequestHistory",
            Action::ScanDirectory(_) => "scanDirectory",
            Action::CheckPath(_) => "checkPath",
            Action::SaveSavedRequest(_) => "saveSavedRequest",
            Action::GetSavedRequests(_) => "getSavedRequests",
            Action::UpdateSavedRequest(_) => "updateSavedRequest",
            Action::DeleteSavedRequest(_) => "deleteSavedRequest",
            Action::ExportSavedRequests(_) => "exportSavedRequests",
            Action::ImportSavedRequests(_) => "importSavedRequests",
            Action::ExportRepositorySavedRequests(_) => "exportRepositorySavedRequests",
            Action::ImportRepositorySavedRequests(_) => "importRepositorySavedRequests",
        }
    }
}

/// Run one decoded action to completion and serialize its result
pub async fn dispatch(state: &AppState, action: Action) -> AppResult<serde_json::Value> {
    let value = match action {
        Action::AddRepository(p) => serde_json::to_value(add_repository(state, p).await?)?,
        Action::GetRepositories => serde_json::to_value(get_repositories(state).await?)?,
        Action::RemoveRepository(p) => serde_json::to_value(remove_repository(state, p).await?)?,
        Action::RefreshRepository(p) => {
            serde_json::to_value(refresh_repository(state, p).await?)?
        }
        Action::GetServices(p) => serde_json::to_value(get_services(state, p).await?)?,
        Action::GetEndpoints(p) => serde_json::to_value(get_endpoints(state, p).await?)?,
        Action::ExecuteRequest(p) => serde_json::to_value(execute_request(state, p).await?)?,
        Action::GetRequestHistory(p) => {
            serde_json::to_value(get_request_history(state, p).await?)?
        }
        Action::ScanDirectory(p) => serde_json::to_value(scan_directory(p).await?)?,
        Action::CheckPath(p) => serde_json::to_value(check_path(p).await?)?,
        Action::SaveSavedRequest(p) => {
            serde_json::to_value(save_saved_request(state, p).await?)?
        }
        Action::GetSavedRequests(p) => {
            serde_json::to_value(get_saved_requests(state, p).await?)?
        }
        Action::UpdateSavedRequest(p) => {
            serde_json::to_value(update_saved_request(state, p).await?)?
        }
        Action::DeleteSavedRequest(p) => {
            serde_json::to_value(delete_saved_request(state, p).await?)?
        }
        Action::ExportSavedRequests(p) => {
            serde_json::to_value(export_saved_requests(state, p).await?)?
        }
        Action::ImportSavedRequests(p) => {
            serde_json::to_value(import_saved_requests(state, p).await?)?
        }
        Action::ExportRepositorySavedRequests(p) => {
            serde_json::to_value(export_repository_saved_requests(state, p).await?)?
        }
        Action::ImportRepositorySavedRequests(p) => {
            serde_json::to_value(import_repository_saved_requests(state, p).await?)?
        }
    };

    Ok(value)
}
