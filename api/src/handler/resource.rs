use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::{id::ResourceId, resource::event::DeactivateResource};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::{
    extractor::AuthorizedUser,
    model::resource::{
        CreateResourceRequest, ResourceResponse, ResourcesResponse, UpdateResourceRequest,
        UpdateResourceRequestWithIds,
    },
};

pub async fn register_resource(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateResourceRequest>,
) -> AppResult<StatusCode> {
    // リソースの登録は管理者のみ
    if !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }
    req.validate(&())?;

    registry
        .resource_repository()
        .create(req.into())
        .await
        .map(|_| StatusCode::CREATED)
}

pub async fn show_resource_list(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ResourcesResponse>> {
    // 管理者には受付停止中のリソースも含めて返す
    let resources = if user.is_admin() {
        registry.resource_repository().find_all().await?
    } else {
        registry.resource_repository().find_active().await?
    };

    Ok(Json(ResourcesResponse::from(resources)))
}

pub async fn show_resource(
    _user: AuthorizedUser,
    Path(resource_id): Path<ResourceId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ResourceResponse>> {
    registry
        .resource_repository()
        .find_by_id(resource_id)
        .await
        .and_then(|r| match r {
            Some(r) => Ok(Json(r.into())),
            None => Err(AppError::EntityNotFound(format!(
                "リソース（{resource_id}）が見つかりませんでした。"
            ))),
        })
}

pub async fn update_resource(
    user: AuthorizedUser,
    Path(resource_id): Path<ResourceId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateResourceRequest>,
) -> AppResult<StatusCode> {
    if !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }
    req.validate(&())?;

    let update_resource = UpdateResourceRequestWithIds::new(resource_id, user.id(), req);
    registry
        .resource_repository()
        .update(update_resource.into())
        .await
        .map(|_| StatusCode::OK)
}

// 過去の予約が参照するため物理削除はせず、受付停止にする
pub async fn deactivate_resource(
    user: AuthorizedUser,
    Path(resource_id): Path<ResourceId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    if !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }
    let deactivate_resource = DeactivateResource {
        resource_id,
        requested_user: user.id(),
    };
    registry
        .resource_repository()
        .deactivate(deactivate_resource)
        .await
        .map(|_| StatusCode::OK)
}
