use async_trait::async_trait;

use crate::model::{
    id::ResourceId,
    resource::{
        event::{CreateResource, DeactivateResource, UpdateResource},
        Resource,
    },
};
use shared::error::AppResult;

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    // リソースを登録する（管理者操作）
    async fn create(&self, event: CreateResource) -> AppResult<ResourceId>;
    // 予約受付中のリソース一覧を取得する
    async fn find_active(&self) -> AppResult<Vec<Resource>>;
    // 停止中も含めた全リソースを取得する（管理者向け）
    async fn find_all(&self) -> AppResult<Vec<Resource>>;
    async fn find_by_id(&self, resource_id: ResourceId) -> AppResult<Option<Resource>>;
    // 登録内容を更新する（管理者操作）
    async fn update(&self, event: UpdateResource) -> AppResult<()>;
    // 新規予約の受付を停止する。過去の予約が参照するため物理削除はしない
    async fn deactivate(&self, event: DeactivateResource) -> AppResult<()>;
}
