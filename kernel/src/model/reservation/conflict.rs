use crate::model::{
    id::{ReservationId, UserId},
    reservation::TimeSlot,
};

// 競合判定の入力となる有効予約（pending / confirmed）の最小表現。
// 呼び出し側で (リソース, 日付, 有効状態) に絞り込んだうえで渡すこと
#[derive(Debug, Clone)]
pub struct ActiveReservation {
    pub reservation_id: ReservationId,
    pub reserved_by: UserId,
    pub slot: TimeSlot,
}

#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub requested_by: UserId,
    pub slot: TimeSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    // 重なり合う有効予約の数がリソースの capacity に達している
    SlotOccupied,
    // 同一利用者・同一リソース・同一日の有効予約がすでに存在する
    PerUserDailyLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResult {
    NoConflict,
    Conflict {
        reason: ConflictReason,
        conflicting_reservation_id: ReservationId,
    },
}

// 候補予約が既存の有効予約と競合するかを判定する純粋関数。
// 申請時（トランザクション内）と診断用の照会の両方から呼ばれる
pub fn check(
    candidate: &Candidate,
    existing: &[ActiveReservation],
    capacity: i32,
    per_user_daily_limit: bool,
) -> ConflictResult {
    // 一人一日一枠ルール。時間帯の重なりに関係なく、
    // 同一利用者の有効予約が一件でもあれば競合
    if per_user_daily_limit {
        if let Some(dup) = existing
            .iter()
            .find(|r| r.reserved_by == candidate.requested_by)
        {
            return ConflictResult::Conflict {
                reason: ConflictReason::PerUserDailyLimit,
                conflicting_reservation_id: dup.reservation_id,
            };
        }
    }

    // 半開区間 [start, end) で重なる有効予約を数え、capacity 到達で競合。
    // capacity 1 のリソースでは「一件でも重なれば競合」に帰着する
    let overlapping: Vec<&ActiveReservation> = existing
        .iter()
        .filter(|r| r.slot.overlaps(&candidate.slot))
        .collect();

    if overlapping.len() as i32 >= capacity {
        if let Some(first) = overlapping.first() {
            return ConflictResult::Conflict {
                reason: ConflictReason::SlotOccupied,
                conflicting_reservation_id: first.reservation_id,
            };
        }
    }

    ConflictResult::NoConflict
}
