use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::services::openapi::{ApiEndpoint, OpenApiSpec, OPENAPI_FILE};
use crate::services::service_config::{ServiceConfig, SERVICE_CONFIG_FILE};

/// Directory under a repository root holding one directory per service
pub const SERVICES_DIR: &str = "services";

/// A service found on disk, before persistence
#[derive(Debug, Clone)]
pub struct DiscoveredService {
    pub service_key: String,
    /// Spec title, or the service key when the spec is missing or unreadable
    pub name: String,
    pub port: i64,
    /// Directory name under `services/`
    pub directory: String,
    pub config: ServiceConfig,
    pub endpoints: Vec<ApiEndpoint>,
}

/// Outcome of walking one repository
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub repo_path: PathBuf,
    pub services: Vec<DiscoveredService>,
    pub errors: Vec<String>,
}

impl ScanResult {
    /// Turn a repository-level failure into an error; non-fatal results pass through
    pub fn into_result(self) -> AppResult<Self> {
        if self.services.is_empty() {
            if let Some(first) = self.errors.first() {
                return Err(AppError::Scan(first.clone()));
            }
        }
        Ok(self)
    }
}

/// Walk `<repo>/services/*` and parse each candidate service directory.
///
/// Repository-level problems (empty or missing root, no services directory)
/// produce zero services and a single error. A candidate with an unreadable
/// config is skipped without an error entry. A candidate whose spec cannot be
/// read is kept with no endpoints.
pub fn scan_repository(repo_path: &Path) -> ScanResult {
    let mut result = ScanResult {
        repo_path: repo_path.to_path_buf(),
        ..Default::default()
    };

    if repo_path.as_os_str().is_empty() {
        result.errors.push("repository path is empty".to_string());
        return result;
    }

    if !repo_path.exists() {
        result.errors.push(format!(
            "repository path does not exist: {}",
            repo_path.display()
        ));
        return result;
    }

    let services_path = repo_path.join(SERVICES_DIR);
    if !services_path.is_dir() {
        result.errors.push(format!(
            "services directory not found: {}",
            services_path.display()
        ));
        return result;
    }

    let candidates = match list_service_dirs(&services_path) {
        Ok(dirs) => dirs,
        Err(e) => {
            result
                .errors
                .push(format!("failed to read services directory: {}", e));
            return result;
        }
    };

    for dir in candidates {
        if let Some(service) = scan_service(&dir) {
            result.services.push(service);
        }
    }

    tracing::info!(
        repo = %repo_path.display(),
        services = result.services.len(),
        "Repository scanned"
    );

    result
}

/// Run [`scan_repository`] on the blocking pool
pub async fn scan(repo_path: PathBuf) -> AppResult<ScanResult> {
    tokio::task::spawn_blocking(move || scan_repository(&repo_path))
        .await
        .map_err(|e| AppError::Internal(format!("scan task failed: {}", e)))
}

/// Immediate subdirectories, sorted by name so a fixed tree always scans in
/// the same order
fn list_service_dirs(services_path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(services_path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn scan_service(service_path: &Path) -> Option<DiscoveredService> {
    let directory = service_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let config = match ServiceConfig::parse_file(&service_path.join(SERVICE_CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(directory = %directory, error = %e, "Skipping service without a valid config");
            return None;
        }
    };

    let mut service = DiscoveredService {
        service_key: config.service_id.clone(),
        name: config.service_id.clone(),
        port: config.env.port,
        directory,
        config,
        endpoints: Vec::new(),
    };

    match OpenApiSpec::parse_file(&service_path.join(OPENAPI_FILE)) {
        Ok(spec) => {
            if !spec.info.title.is_empty() {
                service.name = spec.info.title.clone();
            }
            service.endpoints = spec.extract_endpoints();
        }
        Err(e) => {
            tracing::debug!(
                service = %service.service_key,
                error = %e,
                "No usable OpenAPI document, keeping service without endpoints"
            );
        }
    }

    Some(service)
}
