use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateSavedRequest, Service, SavedRequestWithEndpoint, UpdateSavedRequest, EMPTY_PARAM_LIST,
    EMPTY_PATH_PARAMS,
};
use crate::services::scanner::SERVICES_DIR;
use crate::store::{
    EndpointStore, RepositoryStore, SavedRequestStore, ServiceStore, Store,
};

/// Portable file written next to a service's config
pub const PORTABLE_FILE: &str = "postwhale.saved.yml";

/// Highest file version this build reads and the one it writes
pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableFile {
    pub version: u32,
    pub service_id: String,
    #[serde(default)]
    pub saved_requests: Vec<PortableSavedRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableSavedRequest {
    pub name: String,
    pub endpoint: EndpointRef,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub path_params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRef {
    pub method: String,
    pub path: String,
}

/// One query parameter or header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(default, alias = "Value")]
    pub value: String,
    #[serde(default, alias = "Enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportResult {
    /// `None` when the service had nothing to export
    pub file_path: Option<PathBuf>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub added: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Per-service outcome of a repository-wide export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceExport {
    pub service_key: String,
    pub result: Result<ExportResult, String>,
}

/// Write every saved request of a service to its portable file
pub async fn export_service(db: &DatabaseConnection, service_id: i64) -> AppResult<ExportResult> {
    let service = ServiceStore::find_by_id(db, service_id).await?;
    let service_dir = service_dir(db, &service).await?;

    let rows = SavedRequestStore::list_with_endpoints_by_service(db, service.id).await?;
    if rows.is_empty() {
        return Ok(ExportResult::default());
    }

    let file = PortableFile {
        version: CURRENT_VERSION,
        service_id: service.service_key.clone(),
        saved_requests: rows.iter().map(to_portable).collect(),
    };

    let file_path = service_dir.join(PORTABLE_FILE);
    let yaml = serde_yaml::to_string(&file)?;
    tokio::fs::write(&file_path, yaml).await?;

    tracing::info!(
        service = %service.service_key,
        count = file.saved_requests.len(),
        path = %file_path.display(),
        "Saved requests exported"
    );

    Ok(ExportResult {
        file_path: Some(file_path),
        count: file.saved_requests.len(),
    })
}

/// Merge a service's portable file into the store.
///
/// Items are matched by (endpoint method and path, name): a match is updated
/// in place, anything else is inserted. Items naming an unknown endpoint are
/// skipped with an error entry.
pub async fn import_service(db: &DatabaseConnection, service_id: i64) -> AppResult<ImportResult> {
    let service = ServiceStore::find_by_id(db, service_id).await?;
    let file_path = service_dir(db, &service).await?.join(PORTABLE_FILE);

    let file = read_portable_file(&file_path).await?;

    if file.version > CURRENT_VERSION {
        return Err(AppError::Validation(format!(
            "unsupported saved requests file version: {}",
            file.version
        )));
    }
    if file.service_id != service.service_key {
        return Err(AppError::Validation(format!(
            "service_id mismatch: file has '{}', expected '{}'",
            file.service_id, service.service_key
        )));
    }

    let txn = db.begin().await?;

    let endpoints: HashMap<(String, String), i64> = EndpointStore::list_by_service(&txn, service.id)
        .await?
        .into_iter()
        .map(|e| ((e.method, e.path), e.id))
        .collect();

    let mut existing: HashMap<(i64, String), i64> = SavedRequestStore::list_with_endpoints_by_service(
        &txn, service.id,
    )
    .await?
    .into_iter()
    .map(|row| {
        (
            (row.saved_request.endpoint_id, row.saved_request.name),
            row.saved_request.id,
        )
    })
    .collect();

    let mut result = ImportResult::default();

    for item in file.saved_requests {
        let method = item.endpoint.method.to_uppercase();
        let Some(&endpoint_id) = endpoints.get(&(method.clone(), item.endpoint.path.clone())) else {
            result.errors.push(format!(
                "endpoint not found: {} {}",
                method, item.endpoint.path
            ));
            result.skipped += 1;
            continue;
        };

        let (path_params_json, query_params_json, headers_json) = match encode_params(&item) {
            Ok(blobs) => blobs,
            Err(e) => {
                result.errors.push(format!("failed to encode '{}': {}", item.name, e));
                result.skipped += 1;
                continue;
            }
        };

        match existing.get(&(endpoint_id, item.name.clone())) {
            Some(&id) => {
                let update = UpdateSavedRequest {
                    id,
                    name: item.name.clone(),
                    path_params_json,
                    query_params_json,
                    headers_json,
                    body: item.body,
                };
                match SavedRequestStore::update(&txn, &update).await {
                    Ok(_) => result.replaced += 1,
                    Err(e) => {
                        result.errors.push(format!("failed to update '{}': {}", item.name, e));
                        result.skipped += 1;
                    }
                }
            }
            None => {
                let create = CreateSavedRequest {
                    endpoint_id,
                    name: item.name.clone(),
                    path_params_json,
                    query_params_json,
                    headers_json,
                    body: item.body,
                };
                match SavedRequestStore::create(&txn, &create).await {
                    Ok(saved) => {
                        existing.insert((endpoint_id, saved.name), saved.id);
                        result.added += 1;
                    }
                    Err(e) => {
                        result.errors.push(format!("failed to add '{}': {}", item.name, e));
                        result.skipped += 1;
                    }
                }
            }
        }
    }

    txn.commit().await?;

    tracing::info!(
        service = %service.service_key,
        added = result.added,
        replaced = result.replaced,
        skipped = result.skipped,
        "Saved requests imported"
    );

    Ok(result)
}

/// Export every service of a repository; a failing service does not stop the rest
pub async fn export_repository(
    db: &DatabaseConnection,
    repo_id: i64,
) -> AppResult<Vec<ServiceExport>> {
    RepositoryStore::find_by_id(db, repo_id).await?;

    let mut exports = Vec::new();
    for service in ServiceStore::list_by_repository(db, repo_id).await? {
        match export_service(db, service.id).await {
            Ok(result) if result.count == 0 => {}
            Ok(result) => exports.push(ServiceExport {
                service_key: service.service_key,
                result: Ok(result),
            }),
            Err(e) => {
                tracing::warn!(service = %service.service_key, error = %e, "Export failed");
                exports.push(ServiceExport {
                    service_key: service.service_key,
                    result: Err(e.to_string()),
                });
            }
        }
    }

    Ok(exports)
}

/// Import every service of a repository that has a portable file
pub async fn import_repository(
    db: &DatabaseConnection,
    repo_id: i64,
) -> AppResult<BTreeMap<String, ImportResult>> {
    let repository = RepositoryStore::find_by_id(db, repo_id).await?;

    let mut results = BTreeMap::new();
    for service in ServiceStore::list_by_repository(db, repo_id).await? {
        let file_path = services_root(&repository.path)
            .join(dir_name(&service))
            .join(PORTABLE_FILE);
        if !tokio::fs::try_exists(&file_path).await.unwrap_or(false) {
            continue;
        }

        let result = match import_service(db, service.id).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(service = %service.service_key, error = %e, "Import failed");
                ImportResult {
                    errors: vec![e.to_string()],
                    ..Default::default()
                }
            }
        };
        results.insert(service.service_key, result);
    }

    Ok(results)
}

async fn read_portable_file(file_path: &Path) -> AppResult<PortableFile> {
    let bytes = match tokio::fs::read(file_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "Saved requests file {}",
                file_path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    serde_yaml::from_slice(&bytes)
        .map_err(|e| AppError::Serialization(format!("invalid saved requests file: {}", e)))
}

async fn service_dir(db: &DatabaseConnection, service: &Service) -> AppResult<PathBuf> {
    let repository = RepositoryStore::find_by_id(db, service.repo_id).await?;
    Ok(services_root(&repository.path).join(dir_name(service)))
}

fn services_root(repo_path: &str) -> PathBuf {
    Path::new(repo_path).join(SERVICES_DIR)
}

/// Directory recorded at scan time, or the service key for rows created directly
fn dir_name(service: &Service) -> &str {
    if service.directory.is_empty() {
        &service.service_key
    } else {
        &service.directory
    }
}

/// Stored blobs that fail to decode are left out of the file
fn to_portable(row: &SavedRequestWithEndpoint) -> PortableSavedRequest {
    let saved = &row.saved_request;

    PortableSavedRequest {
        name: saved.name.clone(),
        endpoint: EndpointRef {
            method: row.method.clone(),
            path: row.path.clone(),
        },
        path_params: decode_blob(&saved.path_params_json, &saved.name),
        query_params: decode_blob(&saved.query_params_json, &saved.name),
        headers: decode_blob(&saved.headers_json, &saved.name),
        body: saved.body.clone(),
    }
}

fn decode_blob<T>(blob: &str, name: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    if blob.trim().is_empty() {
        return T::default();
    }
    serde_json::from_str(blob).unwrap_or_else(|e| {
        tracing::debug!(saved_request = %name, error = %e, "Dropping undecodable parameter blob");
        T::default()
    })
}

fn encode_params(item: &PortableSavedRequest) -> AppResult<(String, String, String)> {
    let path_params = if item.path_params.is_empty() {
        EMPTY_PATH_PARAMS.to_string()
    } else {
        serde_json::to_string(&item.path_params)?
    };
    let query_params = if item.query_params.is_empty() {
        EMPTY_PARAM_LIST.to_string()
    } else {
        serde_json::to_string(&item.query_params)?
    };
    let headers = if item.headers.is_empty() {
        EMPTY_PARAM_LIST.to_string()
    } else {
        serde_json::to_string(&item.headers)?
    };
    Ok((path_params, query_params, headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_shape() {
        let yaml = r#"
version: 1
service_id: fusion
saved_requests:
  - name: happy path
    endpoint:
      method: POST
      path: /orders
    query_params:
      - key: dry_run
        value: "true"
        enabled: true
    body: '{"sku":"abc"}'
"#;
        let file: PortableFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.version, 1);
        assert_eq!(file.saved_requests.len(), 1);

        let item = &file.saved_requests[0];
        assert!(item.path_params.is_empty());
        assert!(item.headers.is_empty());
        assert_eq!(item.query_params[0].key, "dry_run");
        assert!(item.query_params[0].enabled);
    }

    #[test]
    fn test_empty_collections_are_omitted() {
        let item = PortableSavedRequest {
            name: "bare".to_string(),
            endpoint: EndpointRef {
                method: "GET".to_string(),
                path: "/health".to_string(),
            },
            path_params: BTreeMap::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: String::new(),
        };
        let yaml = serde_yaml::to_string(&item).unwrap();
        assert!(!yaml.contains("path_params"));
        assert!(!yaml.contains("query_params"));
        assert!(!yaml.contains("headers"));
        assert!(!yaml.contains("body"));
    }

    #[test]
    fn test_capitalized_blob_keys_are_accepted() {
        let rows: Vec<KeyValue> =
            decode_blob(r#"[{"Key":"X-Trace","Value":"1","Enabled":true}]"#, "t");
        assert_eq!(rows[0].key, "X-Trace");
        assert!(rows[0].enabled);

        let broken: Vec<KeyValue> = decode_blob("not json", "t");
        assert!(broken.is_empty());
    }
}
