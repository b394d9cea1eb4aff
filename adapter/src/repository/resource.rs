use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::ResourceId,
    resource::{
        event::{CreateResource, DeactivateResource, UpdateResource},
        Resource,
    },
};
use kernel::repository::resource::ResourceRepository;
use shared::error::{AppError, AppResult};

use crate::database::{model::resource::ResourceRow, ConnectionPool};

#[derive(new)]
pub struct ResourceRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ResourceRepository for ResourceRepositoryImpl {
    async fn create(&self, event: CreateResource) -> AppResult<ResourceId> {
        let resource_id = ResourceId::new();
        sqlx::query(
            r#"
                INSERT INTO resources
                (resource_id, resource_name, category, description,
                capacity, per_user_daily_limit, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(resource_id)
        .bind(event.resource_name)
        .bind(event.category.as_ref())
        .bind(event.description)
        .bind(event.capacity)
        .bind(event.per_user_daily_limit)
        .bind(event.is_active)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(resource_id)
    }

    async fn find_active(&self) -> AppResult<Vec<Resource>> {
        let rows: Vec<ResourceRow> = sqlx::query_as(
            r#"
                SELECT
                    resource_id,
                    resource_name,
                    category,
                    description,
                    capacity,
                    per_user_daily_limit,
                    is_active
                FROM resources
                WHERE is_active = TRUE
                ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Resource::try_from).collect()
    }

    async fn find_all(&self) -> AppResult<Vec<Resource>> {
        let rows: Vec<ResourceRow> = sqlx::query_as(
            r#"
                SELECT
                    resource_id,
                    resource_name,
                    category,
                    description,
                    capacity,
                    per_user_daily_limit,
                    is_active
                FROM resources
                ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Resource::try_from).collect()
    }

    async fn find_by_id(&self, resource_id: ResourceId) -> AppResult<Option<Resource>> {
        let row: Option<ResourceRow> = sqlx::query_as(
            r#"
                SELECT
                    resource_id,
                    resource_name,
                    category,
                    description,
                    capacity,
                    per_user_daily_limit,
                    is_active
                FROM resources
                WHERE resource_id = $1
            "#,
        )
        .bind(resource_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Resource::try_from).transpose()
    }

    async fn update(&self, event: UpdateResource) -> AppResult<()> {
        // 指定のあったフィールドのみ更新する
        let res = sqlx::query(
            r#"
                UPDATE resources
                SET
                    resource_name = COALESCE($2, resource_name),
                    category = COALESCE($3, category),
                    description = COALESCE($4, description),
                    capacity = COALESCE($5, capacity),
                    per_user_daily_limit = COALESCE($6, per_user_daily_limit),
                    is_active = COALESCE($7, is_active)
                WHERE resource_id = $1
            "#,
        )
        .bind(event.resource_id)
        .bind(event.resource_name)
        .bind(event.category.map(|c| c.as_ref().to_string()))
        .bind(event.description)
        .bind(event.capacity)
        .bind(event.per_user_daily_limit)
        .bind(event.is_active)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "リソース（{}）が見つかりませんでした。",
                event.resource_id
            )));
        }

        Ok(())
    }

    async fn deactivate(&self, event: DeactivateResource) -> AppResult<()> {
        // 過去の予約が参照しているため、行は消さずに受付だけ止める
        let res = sqlx::query(
            r#"
                UPDATE resources
                SET is_active = FALSE
                WHERE resource_id = $1
            "#,
        )
        .bind(event.resource_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "リソース（{}）が見つかりませんでした。",
                event.resource_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::resource::ResourceCategory;

    #[sqlx::test(migrations = "../migrations")]
    async fn test_register_resource(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ResourceRepositoryImpl::new(ConnectionPool::new(pool));

        let resource = CreateResource {
            resource_name: "Guest Parking Slot 1".into(),
            category: ResourceCategory::GuestParking,
            description: "Visitor parking near gate 2".into(),
            capacity: 1,
            per_user_daily_limit: false,
            is_active: true,
        };

        let resource_id = repo.create(resource).await?;

        let res = repo.find_active().await?;
        assert_eq!(res.len(), 1);

        let res = repo.find_by_id(resource_id).await?;
        assert!(res.is_some());

        let Resource {
            resource_id: id,
            resource_name,
            category,
            description,
            capacity,
            per_user_daily_limit,
            is_active,
        } = res.unwrap();
        assert_eq!(id, resource_id);
        assert_eq!(resource_name, "Guest Parking Slot 1");
        assert_eq!(category, ResourceCategory::GuestParking);
        assert_eq!(description, "Visitor parking near gate 2");
        assert_eq!(capacity, 1);
        assert!(!per_user_daily_limit);
        assert!(is_active);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_deactivated_resource_is_kept_but_hidden(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = ResourceRepositoryImpl::new(ConnectionPool::new(pool));

        let resource_id = repo
            .create(CreateResource {
                resource_name: "Gym".into(),
                category: ResourceCategory::Gym,
                description: "".into(),
                capacity: 10,
                per_user_daily_limit: true,
                is_active: true,
            })
            .await?;

        repo.deactivate(DeactivateResource {
            resource_id,
            requested_user: kernel::model::id::UserId::new(),
        })
        .await?;

        // 受付中一覧からは消えるが、本体は参照可能なまま残る
        assert!(repo.find_active().await?.is_empty());
        assert_eq!(repo.find_all().await?.len(), 1);

        let res = repo.find_by_id(resource_id).await?.unwrap();
        assert!(!res.is_active);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_update_resource_partial_fields(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ResourceRepositoryImpl::new(ConnectionPool::new(pool));

        let resource_id = repo
            .create(CreateResource {
                resource_name: "Hall".into(),
                category: ResourceCategory::Hall,
                description: "Community hall".into(),
                capacity: 1,
                per_user_daily_limit: false,
                is_active: true,
            })
            .await?;

        repo.update(UpdateResource {
            resource_id,
            resource_name: Some("Hall A".into()),
            category: None,
            description: None,
            capacity: Some(2),
            per_user_daily_limit: None,
            is_active: None,
            requested_user: kernel::model::id::UserId::new(),
        })
        .await?;

        let res = repo.find_by_id(resource_id).await?.unwrap();
        assert_eq!(res.resource_name, "Hall A");
        assert_eq!(res.category, ResourceCategory::Hall);
        assert_eq!(res.description, "Community hall");
        assert_eq!(res.capacity, 2);
        Ok(())
    }
}
