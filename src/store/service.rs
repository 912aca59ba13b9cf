use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::service::{self, ActiveModel, Column, Entity as ServiceEntity};
use crate::error::{AppError, AppResult};
use crate::models::{validate_port, Service, UpsertService};
use crate::store::Store;

/// Services scoped to a repository
pub struct ServiceStore;

#[async_trait]
impl Store<Service> for ServiceStore {
    async fn find_by_id<C>(db: &C, id: i64) -> AppResult<Service>
    where
        C: ConnectionTrait,
    {
        let model = ServiceEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {}", id)))?;

        Ok(model.into())
    }

    async fn delete<C>(db: &C, id: i64) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = ServiceEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Service {}", id)));
        }

        Ok(())
    }
}

impl ServiceStore {
    /// Insert a new service row; fails if (repository, service key) exists
    pub async fn create<C>(db: &C, repo_id: i64, input: &UpsertService) -> AppResult<Service>
    where
        C: ConnectionTrait,
    {
        input.validate()?;

        let model = Self::active_model(repo_id, input)?;
        let result = model.insert(db).await?;
        Ok(result.into())
    }

    /// Insert or update by (repository, service key), returning the resolved row.
    ///
    /// The update path keeps the existing row id. SQLite does not report an
    /// insert id when the conflict branch runs, so the row is always re-read
    /// by its natural key.
    pub async fn upsert<C>(db: &C, repo_id: i64, input: &UpsertService) -> AppResult<Service>
    where
        C: ConnectionTrait,
    {
        input.validate()?;

        let model = Self::active_model(repo_id, input)?;
        ServiceEntity::insert(model)
            .on_conflict(
                OnConflict::columns([Column::RepoId, Column::ServiceKey])
                    .update_columns([
                        Column::Name,
                        Column::Port,
                        Column::Directory,
                        Column::ConfigJson,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Self::find_by_key(db, repo_id, &input.service_key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {}", input.service_key)))
    }

    /// Look up a service by its natural key
    pub async fn find_by_key<C>(
        db: &C,
        repo_id: i64,
        service_key: &str,
    ) -> AppResult<Option<Service>>
    where
        C: ConnectionTrait,
    {
        let model = ServiceEntity::find()
            .filter(Column::RepoId.eq(repo_id))
            .filter(Column::ServiceKey.eq(service_key))
            .one(db)
            .await?;

        Ok(model.map(Into::into))
    }

    /// Services of one repository, ordered by display name
    pub async fn list_by_repository<C>(db: &C, repo_id: i64) -> AppResult<Vec<Service>>
    where
        C: ConnectionTrait,
    {
        let models = ServiceEntity::find()
            .filter(Column::RepoId.eq(repo_id))
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    fn active_model(repo_id: i64, input: &UpsertService) -> AppResult<ActiveModel> {
        let now = time::OffsetDateTime::now_utc();

        Ok(ActiveModel {
            repo_id: Set(repo_id),
            service_key: Set(input.service_key.clone()),
            name: Set(input.name.clone()),
            port: Set(validate_port(input.port)?),
            directory: Set(input.directory.clone()),
            config_json: Set(input.config_json.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    }
}

// Conversion from SeaORM model to our domain model
impl From<service::Model> for Service {
    fn from(m: service::Model) -> Self {
        Self {
            id: m.id,
            repo_id: m.repo_id,
            service_key: m.service_key,
            name: m.name,
            port: m.port,
            directory: m.directory,
            config_json: m.config_json,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
