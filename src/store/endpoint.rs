use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::endpoint::{self, ActiveModel, Column, Entity as EndpointEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Endpoint, HttpMethod, UpsertEndpoint};
use crate::store::Store;

/// Endpoints scoped to a service
pub struct EndpointStore;

#[async_trait]
impl Store<Endpoint> for EndpointStore {
    async fn find_by_id<C>(db: &C, id: i64) -> AppResult<Endpoint>
    where
        C: ConnectionTrait,
    {
        let model = EndpointEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Endpoint {}", id)))?;

        Ok(model.into())
    }

    async fn delete<C>(db: &C, id: i64) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = EndpointEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Endpoint {}", id)));
        }

        Ok(())
    }
}

impl EndpointStore {
    /// Insert a new endpoint; fails if (service, method, path) exists
    pub async fn create<C>(db: &C, service_id: i64, input: &UpsertEndpoint) -> AppResult<Endpoint>
    where
        C: ConnectionTrait,
    {
        let method = input.validate()?;

        let result = Self::active_model(service_id, method, input).insert(db).await?;
        Ok(result.into())
    }

    /// Insert or update by (service, method, path), returning the resolved row
    pub async fn upsert<C>(db: &C, service_id: i64, input: &UpsertEndpoint) -> AppResult<Endpoint>
    where
        C: ConnectionTrait,
    {
        let method = input.validate()?;

        EndpointEntity::insert(Self::active_model(service_id, method, input))
            .on_conflict(
                OnConflict::columns([Column::ServiceId, Column::Method, Column::Path])
                    .update_columns([Column::OperationId, Column::SpecJson, Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Self::find_by_key(db, service_id, method, &input.path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Endpoint {} {}", method, input.path)))
    }

    /// Look up an endpoint by its natural key
    pub async fn find_by_key<C>(
        db: &C,
        service_id: i64,
        method: HttpMethod,
        path: &str,
    ) -> AppResult<Option<Endpoint>>
    where
        C: ConnectionTrait,
    {
        let model = EndpointEntity::find()
            .filter(Column::ServiceId.eq(service_id))
            .filter(Column::Method.eq(method.as_str()))
            .filter(Column::Path.eq(path))
            .one(db)
            .await?;

        Ok(model.map(Into::into))
    }

    /// Endpoints of one service, ordered by path then method
    pub async fn list_by_service<C>(db: &C, service_id: i64) -> AppResult<Vec<Endpoint>>
    where
        C: ConnectionTrait,
    {
        let models = EndpointEntity::find()
            .filter(Column::ServiceId.eq(service_id))
            .order_by_asc(Column::Path)
            .order_by_asc(Column::Method)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    fn active_model(service_id: i64, method: HttpMethod, input: &UpsertEndpoint) -> ActiveModel {
        let now = time::OffsetDateTime::now_utc();

        ActiveModel {
            service_id: Set(service_id),
            method: Set(method.as_str().to_string()),
            path: Set(input.path.clone()),
            operation_id: Set(input.operation_id.clone()),
            spec_json: Set(input.spec_json.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

// Conversion from SeaORM model to our domain model
impl From<endpoint::Model> for Endpoint {
    fn from(m: endpoint::Model) -> Self {
        Self {
            id: m.id,
            service_id: m.service_id,
            method: m.method,
            path: m.path,
            operation_id: m.operation_id,
            spec_json: m.spec_json,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
