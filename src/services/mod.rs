pub mod executor;
pub mod openapi;
pub mod portability;
pub mod reconciler;
pub mod scanner;
pub mod service_config;

pub use executor::{build_url, Environment, ExecutionResponse, RequestConfig, RequestExecutor};
pub use openapi::{ApiEndpoint, OpenApiSpec};
pub use reconciler::{add_repository, reconcile, refresh_repository, ReconcileReport};
pub use scanner::{scan_repository, DiscoveredService, ScanResult};
pub use service_config::ServiceConfig;
