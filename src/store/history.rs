use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entity::request::{self, ActiveModel, Column, Entity as RequestEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CreateHistoryEntry, HistoryEntry};

/// Append-only log of executed calls
pub struct HistoryStore;

impl HistoryStore {
    /// Record one executed call
    pub async fn append<C>(db: &C, input: &CreateHistoryEntry) -> AppResult<HistoryEntry>
    where
        C: ConnectionTrait,
    {
        input.validate()?;

        let model = ActiveModel {
            endpoint_id: Set(input.endpoint_id),
            environment: Set(input.environment.clone()),
            headers: Set(input.headers.clone()),
            body: Set(input.body.clone()),
            response: Set(input.response.clone()),
            created_at: Set(time::OffsetDateTime::now_utc()),
            ..Default::default()
        };

        let result = model.insert(db).await?;
        Ok(result.into())
    }

    /// Most recent entries for an endpoint, newest first
    pub async fn list_by_endpoint<C>(
        db: &C,
        endpoint_id: i64,
        limit: u64,
    ) -> AppResult<Vec<HistoryEntry>>
    where
        C: ConnectionTrait,
    {
        if limit == 0 {
            return Err(AppError::Validation("limit must be positive".to_string()));
        }

        let models = RequestEntity::find()
            .filter(Column::EndpointId.eq(endpoint_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }
}

impl From<request::Model> for HistoryEntry {
    fn from(m: request::Model) -> Self {
        Self {
            id: m.id,
            endpoint_id: m.endpoint_id,
            environment: m.environment,
            headers: m.headers,
            body: m.body,
            response: m.response,
            created_at: m.created_at,
        }
    }
}
