use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{
    id::{ReservationId, ResourceId, UserId},
    reservation::{
        conflict::ConflictResult,
        event::{CreateReservation, TransitionReservation},
        Reservation,
    },
};
use shared::error::AppResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    // 予約を申請する。競合チェックと INSERT を単一トランザクションで行い、
    // 同時申請が二重予約になることはない
    async fn submit(&self, event: CreateReservation) -> AppResult<ReservationId>;
    // 競合の事前診断。副作用を持たず、台帳を変更しない
    async fn check_conflict(&self, event: &CreateReservation) -> AppResult<ConflictResult>;
    // 予約状態を遷移させる（confirm / reject / cancel）
    async fn transition(&self, event: TransitionReservation) -> AppResult<()>;
    // reservation_id から Reservation 型のデータを渡す
    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Reservation>;
    // リソース ID と日付に紐づく有効（pending / confirmed）な予約一覧を取得する
    async fn find_active_by_resource_and_date(
        &self,
        resource_id: ResourceId,
        reserved_on: NaiveDate,
    ) -> AppResult<Vec<Reservation>>;
    // ユーザー ID に紐づく予約一覧を取得する
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>>;
    // リソースの予約履歴（終端状態も含む）を取得する
    async fn find_history_by_resource_id(
        &self,
        resource_id: ResourceId,
    ) -> AppResult<Vec<Reservation>>;
}
