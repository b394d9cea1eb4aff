use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use kernel::model::{
    id::{ReservationId, ResourceId, UserId},
    reservation::{
        conflict::ActiveReservation, Reservation, ReservationResource, ReservationStatus, TimeSlot,
    },
    resource::ResourceCategory,
};
use shared::error::AppError;

// 予約一覧・詳細を取得する際に使う型（リソース・利用者を JOIN した行）
#[derive(sqlx::FromRow)]
pub struct ReservationRow {
    pub reservation_id: ReservationId,
    pub resource_id: ResourceId,
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub reserved_on: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resource_name: String,
    pub category: String,
    pub capacity: i32,
    pub is_active: bool,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = AppError;

    fn try_from(value: ReservationRow) -> Result<Self, Self::Error> {
        let ReservationRow {
            reservation_id,
            resource_id,
            user_id,
            user_name,
            email,
            reserved_on,
            start_time,
            end_time,
            status,
            note,
            created_at,
            resource_name,
            category,
            capacity,
            is_active,
        } = value;
        Ok(Reservation {
            reservation_id,
            reserved_by: user_id,
            user_name,
            email,
            reserved_on,
            // CHECK 制約（start_time < end_time）を通った行なので失敗しない想定
            slot: TimeSlot::new(start_time, end_time)?,
            status: ReservationStatus::from_str(&status).map_err(|_| {
                AppError::ConversionEntityError(format!(
                    "予約状態（{status}）を解釈できませんでした。"
                ))
            })?,
            note,
            created_at,
            resource: ReservationResource {
                resource_id,
                resource_name,
                category: ResourceCategory::from_str(&category).map_err(|_| {
                    AppError::ConversionEntityError(format!(
                        "リソース種別（{category}）を解釈できませんでした。"
                    ))
                })?,
                capacity,
                is_active,
            },
        })
    }
}

// 競合判定のために (リソース, 日付) で絞り込んだ有効予約を読む型
#[derive(sqlx::FromRow)]
pub struct ActiveSlotRow {
    pub reservation_id: ReservationId,
    pub user_id: UserId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TryFrom<ActiveSlotRow> for ActiveReservation {
    type Error = AppError;

    fn try_from(value: ActiveSlotRow) -> Result<Self, Self::Error> {
        let ActiveSlotRow {
            reservation_id,
            user_id,
            start_time,
            end_time,
        } = value;
        Ok(ActiveReservation {
            reservation_id,
            reserved_by: user_id,
            slot: TimeSlot::new(start_time, end_time)?,
        })
    }
}

// 状態遷移時に現在状態と予約者を確認するための型
#[derive(sqlx::FromRow)]
pub struct ReservationStateRow {
    pub reservation_id: ReservationId,
    pub user_id: UserId,
    pub status: String,
}
