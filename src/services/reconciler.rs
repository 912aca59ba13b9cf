use std::collections::HashSet;
use std::path::PathBuf;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use crate::error::{AppError, AppResult};
use crate::models::{CreateRepository, Repository, UpsertEndpoint, UpsertService};
use crate::services::openapi::ApiEndpoint;
use crate::services::scanner::{self, DiscoveredService, ScanResult};
use crate::store::{EndpointStore, RepositoryStore, ServiceStore, Store};

/// Running totals of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub services_touched: usize,
    pub endpoints_touched: usize,
    pub services_removed: usize,
    pub endpoints_removed: usize,
    /// Per-service and per-endpoint failures; none of them stop the pass
    pub errors: Vec<String>,
    /// Scanner messages passed through untouched
    pub warnings: Vec<String>,
}

impl ReconcileReport {
    fn record(&mut self, context: String, err: AppError) {
        tracing::warn!(context = %context, error = %err, "Reconciliation step failed");
        self.errors.push(format!("{}: {}", context, err));
    }
}

/// Register a repository root: scan it, then insert the row and its
/// topology in one transaction
pub async fn add_repository(
    db: &DatabaseConnection,
    input: &CreateRepository,
) -> AppResult<(Repository, ReconcileReport)> {
    input.validate()?;

    if RepositoryStore::find_by_path(db, &input.path).await?.is_some() {
        return Err(AppError::Conflict(format!("Repository {}", input.path)));
    }

    let scan = scanner::scan(PathBuf::from(&input.path))
        .await?
        .into_result()?;

    let txn = db.begin().await?;
    let repository = RepositoryStore::create(&txn, input).await?;
    let report = reconcile(&txn, repository.id, &scan).await;
    txn.commit().await?;

    tracing::info!(
        repository_id = repository.id,
        services = report.services_touched,
        endpoints = report.endpoints_touched,
        "Repository added"
    );

    Ok((repository, report))
}

/// Re-scan a registered repository and reconcile the stored topology
pub async fn refresh_repository(
    db: &DatabaseConnection,
    repo_id: i64,
) -> AppResult<(Repository, ReconcileReport)> {
    let repository = RepositoryStore::find_by_id(db, repo_id).await?;

    let scan = scanner::scan(PathBuf::from(&repository.path))
        .await?
        .into_result()?;

    let txn = db.begin().await?;
    let report = reconcile(&txn, repository.id, &scan).await;
    txn.commit().await?;

    tracing::info!(
        repository_id = repository.id,
        services = report.services_touched,
        endpoints = report.endpoints_touched,
        services_removed = report.services_removed,
        endpoints_removed = report.endpoints_removed,
        errors = report.errors.len(),
        "Repository refreshed"
    );

    Ok((repository, report))
}

/// Bring the stored services and endpoints of a repository in line with a
/// fresh scan.
///
/// Matching is by natural key: service key within the repository, then
/// (method, path) within each service. Rows that still match keep their id.
/// Vanished rows are deleted along with their history and saved requests.
/// Failures are recorded in the report and the pass moves on.
pub async fn reconcile<C>(db: &C, repo_id: i64, scan: &ScanResult) -> ReconcileReport
where
    C: ConnectionTrait,
{
    let mut report = ReconcileReport {
        warnings: scan.errors.clone(),
        ..Default::default()
    };

    let fresh_keys: HashSet<&str> = scan
        .services
        .iter()
        .map(|s| s.service_key.as_str())
        .collect();

    match ServiceStore::list_by_repository(db, repo_id).await {
        Ok(existing) => {
            for service in existing {
                if fresh_keys.contains(service.service_key.as_str()) {
                    continue;
                }
                match ServiceStore::delete(db, service.id).await {
                    Ok(()) => report.services_removed += 1,
                    Err(e) => report.record(format!("service {}", service.service_key), e),
                }
            }
        }
        Err(e) => report.record("listing services".to_string(), e),
    }

    for discovered in &scan.services {
        reconcile_service(db, repo_id, discovered, &mut report).await;
    }

    report
}

async fn reconcile_service<C>(
    db: &C,
    repo_id: i64,
    discovered: &DiscoveredService,
    report: &mut ReconcileReport,
) where
    C: ConnectionTrait,
{
    let context = format!("service {}", discovered.service_key);

    let config_json = match discovered.config.to_blob() {
        Ok(blob) => blob,
        Err(e) => return report.record(context, e),
    };

    let input = UpsertService {
        service_key: discovered.service_key.clone(),
        name: discovered.name.clone(),
        port: discovered.port,
        directory: discovered.directory.clone(),
        config_json,
    };

    let service = match ServiceStore::upsert(db, repo_id, &input).await {
        Ok(service) => service,
        Err(e) => return report.record(context, e),
    };
    report.services_touched += 1;

    reconcile_endpoints(db, service.id, &discovered.endpoints, report).await;
}

async fn reconcile_endpoints<C>(
    db: &C,
    service_id: i64,
    fresh: &[ApiEndpoint],
    report: &mut ReconcileReport,
) where
    C: ConnectionTrait,
{
    let fresh_keys: HashSet<(String, String)> = fresh
        .iter()
        .map(|e| (e.method.as_str().to_string(), e.path.clone()))
        .collect();

    match EndpointStore::list_by_service(db, service_id).await {
        Ok(existing) => {
            for endpoint in existing {
                if fresh_keys.contains(&endpoint.natural_key()) {
                    continue;
                }
                match EndpointStore::delete(db, endpoint.id).await {
                    Ok(()) => report.endpoints_removed += 1,
                    Err(e) => report.record(
                        format!("endpoint {} {}", endpoint.method, endpoint.path),
                        e,
                    ),
                }
            }
        }
        Err(e) => report.record(format!("listing endpoints of service {}", service_id), e),
    }

    for endpoint in fresh {
        let context = format!("endpoint {} {}", endpoint.method, endpoint.path);

        let spec_json = match endpoint.to_blob() {
            Ok(blob) => blob,
            Err(e) => {
                report.record(context, e);
                continue;
            }
        };

        let input = UpsertEndpoint {
            method: endpoint.method.as_str().to_string(),
            path: endpoint.path.clone(),
            operation_id: endpoint.operation_id.clone(),
            spec_json,
        };

        match EndpointStore::upsert(db, service_id, &input).await {
            Ok(_) => report.endpoints_touched += 1,
            Err(e) => report.record(context, e),
        }
    }
}
