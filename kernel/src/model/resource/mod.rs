use strum::{AsRefStr, EnumString};

use crate::model::id::ResourceId;

pub mod event;

// 共用施設の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceCategory {
    Pool,
    Gym,
    Hall,
    Garden,
    GuestParking,
    Other,
}

#[derive(Debug)]
pub struct Resource {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub category: ResourceCategory,
    pub description: String,
    // 同一時間帯に同時に保持できる有効予約の上限。来客駐車場はすべて 1
    pub capacity: i32,
    // true の場合、同一利用者は同一日に 1 件しか有効予約を持てない
    pub per_user_daily_limit: bool,
    // false のリソースは新規予約を受け付けない（過去の予約は保持する）
    pub is_active: bool,
}
