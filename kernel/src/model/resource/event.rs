use crate::model::{
    id::{ResourceId, UserId},
    resource::ResourceCategory,
};

pub struct CreateResource {
    pub resource_name: String,
    pub category: ResourceCategory,
    pub description: String,
    pub capacity: i32,
    pub per_user_daily_limit: bool,
    pub is_active: bool,
}

#[derive(Debug)]
pub struct UpdateResource {
    pub resource_id: ResourceId,
    pub resource_name: Option<String>,
    pub category: Option<ResourceCategory>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
    pub per_user_daily_limit: Option<bool>,
    pub is_active: Option<bool>,
    pub requested_user: UserId,
}

// リソースは物理削除しない。is_active を落とすのみ
#[derive(Debug)]
pub struct DeactivateResource {
    pub resource_id: ResourceId,
    pub requested_user: UserId,
}
