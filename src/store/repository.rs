use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::repository::{self, ActiveModel, Column, Entity as RepositoryEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CreateRepository, Repository};
use crate::store::Store;

/// Registered repository roots
pub struct RepositoryStore;

#[async_trait]
impl Store<Repository> for RepositoryStore {
    async fn find_by_id<C>(db: &C, id: i64) -> AppResult<Repository>
    where
        C: ConnectionTrait,
    {
        let model = RepositoryEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Repository {}", id)))?;

        Ok(model.into())
    }

    async fn delete<C>(db: &C, id: i64) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = RepositoryEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Repository {}", id)));
        }

        Ok(())
    }
}

impl RepositoryStore {
    /// Register a new repository root; the path must not be registered yet
    pub async fn create<C>(db: &C, input: &CreateRepository) -> AppResult<Repository>
    where
        C: ConnectionTrait,
    {
        input.validate()?;

        if Self::find_by_path(db, &input.path).await?.is_some() {
            return Err(AppError::Conflict(format!("Repository {}", input.path)));
        }

        let model = ActiveModel {
            name: Set(input.name.clone()),
            path: Set(input.path.clone()),
            created_at: Set(time::OffsetDateTime::now_utc()),
            ..Default::default()
        };

        let result = model.insert(db).await?;
        Ok(result.into())
    }

    /// Look up a repository by its absolute path
    pub async fn find_by_path<C>(db: &C, path: &str) -> AppResult<Option<Repository>>
    where
        C: ConnectionTrait,
    {
        let model = RepositoryEntity::find()
            .filter(Column::Path.eq(path))
            .one(db)
            .await?;

        Ok(model.map(Into::into))
    }

    /// All repositories, newest first
    pub async fn list<C>(db: &C) -> AppResult<Vec<Repository>>
    where
        C: ConnectionTrait,
    {
        let models = RepositoryEntity::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }
}

// Conversion from SeaORM model to our domain model
impl From<repository::Model> for Repository {
    fn from(m: repository::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            path: m.path,
            created_at: m.created_at,
        }
    }
}
