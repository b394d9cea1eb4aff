use chrono::NaiveDate;
use derive_new::new;

use crate::model::{
    id::{ReservationId, ResourceId, UserId},
    reservation::{ReservationAction, TimeSlot},
    role::Role,
};

// 予約の新規申請。TimeSlot が検証済みのため、時間帯の不正はここに乗らない
#[derive(new, Debug)]
pub struct CreateReservation {
    pub resource_id: ResourceId,
    pub requested_by: UserId,
    pub reserved_on: NaiveDate,
    pub slot: TimeSlot,
    pub note: Option<String>,
}

// 予約状態の遷移要求。認可判定に必要な操作者情報を併せて運ぶ
#[derive(new, Debug)]
pub struct TransitionReservation {
    pub reservation_id: ReservationId,
    pub action: ReservationAction,
    pub actor: UserId,
    pub actor_role: Role,
    pub reason: Option<String>,
}
