use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

use crate::entity::endpoint::{self, Entity as EndpointEntity};
use crate::entity::saved_request::{self, ActiveModel, Column, Entity as SavedRequestEntity};
use crate::error::{AppError, AppResult};
use crate::models::{
    or_default_blob, CreateSavedRequest, SavedRequest, SavedRequestWithEndpoint,
    UpdateSavedRequest, EMPTY_PARAM_LIST, EMPTY_PATH_PARAMS,
};
use crate::store::Store;

/// Named parameter presets attached to endpoints
pub struct SavedRequestStore;

#[async_trait]
impl Store<SavedRequest> for SavedRequestStore {
    async fn find_by_id<C>(db: &C, id: i64) -> AppResult<SavedRequest>
    where
        C: ConnectionTrait,
    {
        let model = SavedRequestEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saved request {}", id)))?;

        Ok(model.into())
    }

    async fn delete<C>(db: &C, id: i64) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = SavedRequestEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Saved request {}", id)));
        }

        Ok(())
    }
}

impl SavedRequestStore {
    /// Create a saved request; empty blobs fall back to `{}` / `[]`
    pub async fn create<C>(db: &C, input: &CreateSavedRequest) -> AppResult<SavedRequest>
    where
        C: ConnectionTrait,
    {
        input.validate()?;

        let model = ActiveModel {
            endpoint_id: Set(input.endpoint_id),
            name: Set(input.name.clone()),
            path_params_json: Set(or_default_blob(
                input.path_params_json.clone(),
                EMPTY_PATH_PARAMS,
            )),
            query_params_json: Set(or_default_blob(
                input.query_params_json.clone(),
                EMPTY_PARAM_LIST,
            )),
            headers_json: Set(or_default_blob(input.headers_json.clone(), EMPTY_PARAM_LIST)),
            body: Set(input.body.clone()),
            created_at: Set(time::OffsetDateTime::now_utc()),
            ..Default::default()
        };

        let result = model.insert(db).await?;
        Ok(result.into())
    }

    /// Saved requests of one endpoint, newest first
    pub async fn list_by_endpoint<C>(db: &C, endpoint_id: i64) -> AppResult<Vec<SavedRequest>>
    where
        C: ConnectionTrait,
    {
        let models = SavedRequestEntity::find()
            .filter(Column::EndpointId.eq(endpoint_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// Replace every mutable field of an existing saved request
    pub async fn update<C>(db: &C, input: &UpdateSavedRequest) -> AppResult<SavedRequest>
    where
        C: ConnectionTrait,
    {
        input.validate()?;

        let existing = SavedRequestEntity::find_by_id(input.id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saved request {}", input.id)))?;

        let mut model = existing.into_active_model();
        model.name = Set(input.name.clone());
        model.path_params_json = Set(or_default_blob(
            input.path_params_json.clone(),
            EMPTY_PATH_PARAMS,
        ));
        model.query_params_json = Set(or_default_blob(
            input.query_params_json.clone(),
            EMPTY_PARAM_LIST,
        ));
        model.headers_json = Set(or_default_blob(input.headers_json.clone(), EMPTY_PARAM_LIST));
        model.body = Set(input.body.clone());

        let result = model.update(db).await?;
        Ok(result.into())
    }

    /// Every saved request under a service, joined with its endpoint's method and path
    pub async fn list_with_endpoints_by_service<C>(
        db: &C,
        service_id: i64,
    ) -> AppResult<Vec<SavedRequestWithEndpoint>>
    where
        C: ConnectionTrait,
    {
        let rows = SavedRequestEntity::find()
            .find_also_related(EndpointEntity)
            .filter(endpoint::Column::ServiceId.eq(service_id))
            .order_by_asc(endpoint::Column::Path)
            .order_by_asc(endpoint::Column::Method)
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(saved, endpoint)| {
                endpoint.map(|e| SavedRequestWithEndpoint {
                    saved_request: saved.into(),
                    method: e.method,
                    path: e.path,
                })
            })
            .collect())
    }
}

impl From<saved_request::Model> for SavedRequest {
    fn from(m: saved_request::Model) -> Self {
        Self {
            id: m.id,
            endpoint_id: m.endpoint_id,
            name: m.name,
            path_params_json: m.path_params_json,
            query_params_json: m.query_params_json,
            headers_json: m.headers_json,
            body: m.body,
            created_at: m.created_at,
        }
    }
}
