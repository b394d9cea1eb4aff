use std::str::FromStr;

use kernel::model::{
    id::ResourceId,
    resource::{Resource, ResourceCategory},
};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct ResourceRow {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub category: String,
    pub description: String,
    pub capacity: i32,
    pub per_user_daily_limit: bool,
    pub is_active: bool,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = AppError;

    fn try_from(value: ResourceRow) -> Result<Self, Self::Error> {
        let ResourceRow {
            resource_id,
            resource_name,
            category,
            description,
            capacity,
            per_user_daily_limit,
            is_active,
        } = value;
        Ok(Resource {
            resource_id,
            resource_name,
            category: ResourceCategory::from_str(&category).map_err(|_| {
                AppError::ConversionEntityError(format!(
                    "リソース種別（{category}）を解釈できませんでした。"
                ))
            })?,
            description,
            capacity,
            per_user_daily_limit,
            is_active,
        })
    }
}

// 申請受付（Admission）の判定に必要な設定だけを読むための型
#[derive(sqlx::FromRow)]
pub struct ResourceRuleRow {
    pub resource_id: ResourceId,
    pub capacity: i32,
    pub per_user_daily_limit: bool,
    pub is_active: bool,
}
