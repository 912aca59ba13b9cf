pub mod endpoint;
pub mod history;
pub mod repository;
pub mod saved_request;
pub mod service;

pub use endpoint::EndpointStore;
pub use history::HistoryStore;
pub use repository::RepositoryStore;
pub use saved_request::SavedRequestStore;
pub use service::ServiceStore;

use async_trait::async_trait;
use sea_orm::ConnectionTrait;

use crate::error::AppResult;

/// Base trait for identity lookups and deletes shared by every table.
///
/// Generic over the connection so the same calls run on the shared
/// connection or inside a reconciliation transaction.
#[async_trait]
pub trait Store<T>
where
    T: Send + Sync,
{
    /// Find entity by ID
    async fn find_by_id<C>(db: &C, id: i64) -> AppResult<T>
    where
        C: ConnectionTrait;

    /// Delete entity by ID (children go with it through ON DELETE CASCADE)
    async fn delete<C>(db: &C, id: i64) -> AppResult<()>
    where
        C: ConnectionTrait;
}
