use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use strum::{AsRefStr, EnumString};

use crate::model::{
    id::{ReservationId, ResourceId, UserId},
    resource::ResourceCategory,
    role::Role,
};
use shared::error::{AppError, AppResult};

pub mod conflict;
pub mod event;

// 予約の時間帯。半開区間 [start, end) として扱う
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    // start < end（同一日内）でなければ予約対象として成立しない。
    // 長さゼロや日またぎの指定はここで弾くため、台帳には決して届かない
    pub fn new(start: NaiveTime, end: NaiveTime) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::UnprocessableEntity(format!(
                "予約時間帯が不正です（start: {start}, end: {end}）。開始時刻は終了時刻より前を指定してください。"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    // 半開区間同士の重なり判定。
    // 隣接（一方の end ＝ 他方の start）は重なりとみなさない
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl ReservationStatus {
    // pending / confirmed のみが競合判定の対象になる
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    // rejected / cancelled は終端状態。以後どの遷移も受け付けず、
    // 競合判定からも恒久的に除外される
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }

    // 状態遷移表。ここに無い組み合わせはすべて InvalidTransition
    pub fn transition(self, action: ReservationAction) -> AppResult<ReservationStatus> {
        use ReservationAction::*;
        use ReservationStatus::*;
        match (self, action) {
            (Pending, Confirm) => Ok(Confirmed),
            (Pending, Reject) => Ok(Rejected),
            (Pending, Cancel) | (Confirmed, Cancel) => Ok(Cancelled),
            (from, action) => Err(AppError::InvalidTransition(format!(
                "予約状態（{}）に対して操作（{}）は適用できません。",
                from.as_ref(),
                action.as_ref(),
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ReservationAction {
    Confirm,
    Reject,
    Cancel,
}

impl ReservationAction {
    // confirm / reject は管理者のみ。cancel は予約者本人または管理者
    pub fn permitted(&self, actor_role: Role, is_requester: bool) -> bool {
        match self {
            Self::Confirm | Self::Reject => actor_role == Role::Admin,
            Self::Cancel => is_requester || actor_role == Role::Admin,
        }
    }
}

#[derive(Debug)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub reserved_by: UserId,
    pub user_name: String,
    pub email: String,
    pub reserved_on: NaiveDate,
    pub slot: TimeSlot,
    pub status: ReservationStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resource: ReservationResource,
}

#[derive(Debug)]
pub struct ReservationResource {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub category: ResourceCategory,
    pub capacity: i32,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_time_slot_rejects_zero_length() {
        let res = TimeSlot::new(time(10, 0), time(10, 0));
        assert!(matches!(res, Err(AppError::UnprocessableEntity(_))));
    }

    #[test]
    fn test_time_slot_rejects_inverted_range() {
        // 日またぎ相当（end < start）も不正として扱う
        let res = TimeSlot::new(time(22, 0), time(1, 0));
        assert!(matches!(res, Err(AppError::UnprocessableEntity(_))));
    }

    #[test]
    fn test_adjacent_slots_do_not_overlap() {
        let a = TimeSlot::new(time(10, 0), time(12, 0)).unwrap();
        let b = TimeSlot::new(time(12, 0), time(14, 0)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_partially_overlapping_slots() {
        let a = TimeSlot::new(time(10, 0), time(12, 0)).unwrap();
        let b = TimeSlot::new(time(11, 0), time(13, 0)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_contained_slot_overlaps() {
        let outer = TimeSlot::new(time(9, 0), time(17, 0)).unwrap();
        let inner = TimeSlot::new(time(12, 0), time(13, 0)).unwrap();
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_active_and_terminal_states_partition() {
        use ReservationStatus::*;

        for status in [Pending, Confirmed, Rejected, Cancelled] {
            assert_ne!(status.is_active(), status.is_terminal());
        }
        assert!(Pending.is_active());
        assert!(Confirmed.is_active());
        assert!(Rejected.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn test_transition_table() {
        use ReservationAction::*;
        use ReservationStatus::*;

        assert_eq!(Pending.transition(Confirm).unwrap(), Confirmed);
        assert_eq!(Pending.transition(Reject).unwrap(), Rejected);
        assert_eq!(Pending.transition(Cancel).unwrap(), Cancelled);
        assert_eq!(Confirmed.transition(Cancel).unwrap(), Cancelled);
    }

    #[test]
    fn test_confirm_twice_is_invalid() {
        use ReservationAction::*;
        use ReservationStatus::*;

        let confirmed = Pending.transition(Confirm).unwrap();
        assert!(matches!(
            confirmed.transition(Confirm),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_terminal_states_accept_no_action() {
        use ReservationAction::*;
        use ReservationStatus::*;

        for terminal in [Rejected, Cancelled] {
            for action in [Confirm, Reject, Cancel] {
                assert!(matches!(
                    terminal.transition(action),
                    Err(AppError::InvalidTransition(_))
                ));
            }
        }
    }

    #[test]
    fn test_authorization_matrix() {
        use ReservationAction::*;

        // 確定・却下は管理者のみ
        assert!(Confirm.permitted(Role::Admin, false));
        assert!(!Confirm.permitted(Role::Resident, true));
        assert!(Reject.permitted(Role::Admin, false));
        assert!(!Reject.permitted(Role::Resident, true));

        // 取消は本人または管理者
        assert!(Cancel.permitted(Role::Resident, true));
        assert!(Cancel.permitted(Role::Admin, false));
        assert!(!Cancel.permitted(Role::Resident, false));
    }
}
