use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use derive_new::new;
use sqlx::error::{DatabaseError, ErrorKind};

use kernel::model::{
    id::{ReservationId, ResourceId, UserId},
    reservation::{
        conflict::{self, ConflictReason, ConflictResult},
        event::{CreateReservation, TransitionReservation},
        Reservation, ReservationStatus,
    },
};
use kernel::repository::reservation::ReservationRepository;
use shared::error::{AppError, AppResult};

use crate::database::{
    model::{
        reservation::{ActiveSlotRow, ReservationRow, ReservationStateRow},
        resource::ResourceRuleRow,
    },
    ConnectionPool,
};

#[derive(new)]
pub struct ReservationRepositoryImpl {
    db: ConnectionPool,
    // true なら申請と同時に confirmed、false なら管理者承認待ち（pending）
    auto_confirm: bool,
}

#[async_trait]
impl ReservationRepository for ReservationRepositoryImpl {
    // 予約申請操作を行う
    async fn submit(&self, event: CreateReservation) -> AppResult<ReservationId> {
        // 事前のチェックとして、以下を調べる。
        // - 指定のリソース ID をもつリソースが存在し、受付中（is_active）か
        // - 申請者が住民ディレクトリに存在するか
        //
        // リソース設定の読み取りはトランザクション外で行う。
        // 設定変更は低頻度の管理操作であり、ここでの競合は許容する
        let rule = self.resource_rule(event.resource_id).await?;

        let requester: Option<(UserId,)> = sqlx::query_as(
            r#"
                SELECT user_id
                FROM users
                WHERE user_id = $1
            "#,
        )
        .bind(event.requested_by)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if requester.is_none() {
            return Err(AppError::EntityNotFound(format!(
                "利用者（{}）が見つかりませんでした。",
                event.requested_by
            )));
        }

        let mut tx = self.db.begin().await?;

        // capacity 1 のリソースは排他制約が最終防壁になるため
        // 既定の分離レベルのままでよい。capacity > 1 は重なり件数の
        // カウントで判定するため、トランザクションを SERIALIZABLE にする
        if rule.capacity > 1 {
            self.set_transaction_serializable(&mut tx).await?;
        }

        // 有効（pending / confirmed）な予約のみを競合判定の対象として取得する。
        // rejected / cancelled は恒久的に判定から除外される
        let active_rows: Vec<ActiveSlotRow> = sqlx::query_as(
            r#"
                SELECT reservation_id, user_id, start_time, end_time
                FROM reservations
                WHERE resource_id = $1
                  AND reserved_on = $2
                  AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(event.resource_id)
        .bind(event.reserved_on)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let existing = active_rows
            .into_iter()
            .map(conflict::ActiveReservation::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        let candidate = conflict::Candidate {
            requested_by: event.requested_by,
            slot: event.slot,
        };

        if let ConflictResult::Conflict {
            reason,
            conflicting_reservation_id,
        } = conflict::check(
            &candidate,
            &existing,
            rule.capacity,
            rule.per_user_daily_limit,
        ) {
            return Err(Self::slot_unavailable(
                event.resource_id,
                reason,
                conflicting_reservation_id,
            ));
        }

        // 予約処理を行う、すなわち reservations テーブルにレコードを追加する。
        // 上記の事前チェックをすり抜けた同時申請は、排他制約
        // （reservations_no_overlap）または部分一意インデックス
        // （reservations_per_user_daily_idx）の違反としてここで失敗する
        let reservation_id = ReservationId::new();
        let initial_status = if self.auto_confirm {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        };
        let res = sqlx::query(
            r#"
                INSERT INTO reservations
                (reservation_id, resource_id, user_id, reserved_on,
                start_time, end_time, status, note,
                exclusive_slot, per_user_daily_limit)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(reservation_id)
        .bind(event.resource_id)
        .bind(event.requested_by)
        .bind(event.reserved_on)
        .bind(event.slot.start())
        .bind(event.slot.end())
        .bind(initial_status.as_ref())
        .bind(event.note)
        .bind(rule.capacity == 1)
        .bind(rule.per_user_daily_limit)
        .execute(&mut *tx)
        .await
        .map_err(Self::admission_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(reservation_id)
    }

    // 競合の事前診断を行う。台帳を変更しない
    async fn check_conflict(&self, event: &CreateReservation) -> AppResult<ConflictResult> {
        let rule = self.resource_rule(event.resource_id).await?;

        let active_rows: Vec<ActiveSlotRow> = sqlx::query_as(
            r#"
                SELECT reservation_id, user_id, start_time, end_time
                FROM reservations
                WHERE resource_id = $1
                  AND reserved_on = $2
                  AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(event.resource_id)
        .bind(event.reserved_on)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let existing = active_rows
            .into_iter()
            .map(conflict::ActiveReservation::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        let candidate = conflict::Candidate {
            requested_by: event.requested_by,
            slot: event.slot,
        };

        Ok(conflict::check(
            &candidate,
            &existing,
            rule.capacity,
            rule.per_user_daily_limit,
        ))
    }

    // 予約状態の遷移操作を行う
    async fn transition(&self, event: TransitionReservation) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        // 対象行をロックして現在状態を固定する。
        // 同一予約に対する同時遷移はここで直列化される
        let row: Option<ReservationStateRow> = sqlx::query_as(
            r#"
                SELECT reservation_id, user_id, status
                FROM reservations
                WHERE reservation_id = $1
                FOR UPDATE
            "#,
        )
        .bind(event.reservation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(AppError::EntityNotFound(format!(
                "予約（{}）が見つかりませんでした。",
                event.reservation_id
            )));
        };

        // 認可：confirm / reject は管理者のみ、cancel は予約者本人または管理者
        let is_requester = row.user_id == event.actor;
        if !event.action.permitted(event.actor_role, is_requester) {
            return Err(AppError::ForbiddenOperation);
        }

        let current = ReservationStatus::from_str(&row.status).map_err(|_| {
            AppError::ConversionEntityError(format!(
                "予約状態（{}）を解釈できませんでした。",
                row.status
            ))
        })?;
        // 遷移表に無い組み合わせはここで InvalidTransition になる
        let next = current.transition(event.action)?;

        // 却下・取消の理由は管理メモとして残す。
        // 終端状態へ遷移した行は部分制約の対象から外れるため、
        // 明示的な「解放」処理は不要（時間帯は暗黙に空く）
        let res = sqlx::query(
            r#"
                UPDATE reservations
                SET status = $2, note = COALESCE($3, note)
                WHERE reservation_id = $1
            "#,
        )
        .bind(event.reservation_id)
        .bind(next.as_ref())
        .bind(event.reason)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been updated".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Reservation> {
        let row: Option<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.resource_id,
                r.user_id,
                u.user_name,
                u.email,
                r.reserved_on,
                r.start_time,
                r.end_time,
                r.status,
                r.note,
                r.created_at,
                res.resource_name,
                res.category,
                res.capacity,
                res.is_active
                FROM reservations AS r
                INNER JOIN resources AS res ON r.resource_id = res.resource_id
                INNER JOIN users AS u ON r.user_id = u.user_id
                WHERE r.reservation_id = $1
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        match row {
            Some(row) => Reservation::try_from(row),
            None => Err(AppError::EntityNotFound(format!(
                "予約（{}）が見つかりませんでした。",
                reservation_id
            ))),
        }
    }

    // リソース ID と日付に紐づく有効な予約一覧を取得する
    async fn find_active_by_resource_and_date(
        &self,
        resource_id: ResourceId,
        reserved_on: NaiveDate,
    ) -> AppResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.resource_id,
                r.user_id,
                u.user_name,
                u.email,
                r.reserved_on,
                r.start_time,
                r.end_time,
                r.status,
                r.note,
                r.created_at,
                res.resource_name,
                res.category,
                res.capacity,
                res.is_active
                FROM reservations AS r
                INNER JOIN resources AS res ON r.resource_id = res.resource_id
                INNER JOIN users AS u ON r.user_id = u.user_id
                WHERE r.resource_id = $1
                  AND r.reserved_on = $2
                  AND r.status IN ('pending', 'confirmed')
                ORDER BY r.start_time ASC
            "#,
        )
        .bind(resource_id)
        .bind(reserved_on)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    // ユーザー ID に紐づく予約一覧を取得する
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.resource_id,
                r.user_id,
                u.user_name,
                u.email,
                r.reserved_on,
                r.start_time,
                r.end_time,
                r.status,
                r.note,
                r.created_at,
                res.resource_name,
                res.category,
                res.capacity,
                res.is_active
                FROM reservations AS r
                INNER JOIN resources AS res ON r.resource_id = res.resource_id
                INNER JOIN users AS u ON r.user_id = u.user_id
                WHERE r.user_id = $1
                ORDER BY r.reserved_on ASC, r.start_time ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    // リソースの予約履歴（終端状態も含む）を取得する
    async fn find_history_by_resource_id(
        &self,
        resource_id: ResourceId,
    ) -> AppResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
                SELECT
                r.reservation_id,
                r.resource_id,
                r.user_id,
                u.user_name,
                u.email,
                r.reserved_on,
                r.start_time,
                r.end_time,
                r.status,
                r.note,
                r.created_at,
                res.resource_name,
                res.category,
                res.capacity,
                res.is_active
                FROM reservations AS r
                INNER JOIN resources AS res ON r.resource_id = res.resource_id
                INNER JOIN users AS u ON r.user_id = u.user_id
                WHERE r.resource_id = $1
                ORDER BY r.created_at DESC
            "#,
        )
        .bind(resource_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }
}

impl ReservationRepositoryImpl {
    // 申請受付の判定に必要なリソース設定を取得し、
    // 存在しない・受付停止中の場合はこの時点で申請を退ける
    async fn resource_rule(&self, resource_id: ResourceId) -> AppResult<ResourceRuleRow> {
        let row: Option<ResourceRuleRow> = sqlx::query_as(
            r#"
                SELECT resource_id, capacity, per_user_daily_limit, is_active
                FROM resources
                WHERE resource_id = $1
            "#,
        )
        .bind(resource_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(rule) = row else {
            return Err(AppError::EntityNotFound(format!(
                "リソース（{}）が見つかりませんでした。",
                resource_id
            )));
        };

        if !rule.is_active {
            return Err(AppError::UnprocessableEntity(format!(
                "リソース（{}）は現在予約を受け付けていません（is_active = false）。",
                resource_id
            )));
        }

        Ok(rule)
    }

    // capacity > 1 の判定（重なり件数のカウント）を同時申請に対して
    // 正しく保つため、トランザクション分離レベルを SERIALIZABLE にする
    async fn set_transaction_serializable(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> AppResult<()> {
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut **tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    fn slot_unavailable(
        resource_id: ResourceId,
        reason: ConflictReason,
        conflicting_reservation_id: ReservationId,
    ) -> AppError {
        match reason {
            ConflictReason::SlotOccupied => AppError::SlotUnavailable(format!(
                "リソース（{resource_id}）は指定時間帯にすでに予約（{conflicting_reservation_id}）が存在します。"
            )),
            ConflictReason::PerUserDailyLimit => AppError::SlotUnavailable(format!(
                "リソース（{resource_id}）には同日の予約（{conflicting_reservation_id}）がすでに存在します。同一日に取得できる予約は一件までです。"
            )),
        }
    }

    // INSERT 時のエラー変換。一意制約・排他制約の違反は
    // 「同時申請に敗れた」ことを意味するため SlotUnavailable として返す
    fn admission_error(e: sqlx::Error) -> AppError {
        if Self::is_slot_constraint_violation(&e) {
            return AppError::SlotUnavailable(
                "指定の時間帯はすでに他の予約で埋まっています。".into(),
            );
        }
        AppError::SpecificOperationError(e)
    }

    fn is_slot_constraint_violation(e: &sqlx::Error) -> bool {
        let Some(db_err) = e.as_database_error() else {
            return false;
        };
        if matches!(db_err.kind(), ErrorKind::UniqueViolation) {
            return true;
        }
        // 排他制約違反（SQLSTATE 23P01）は sqlx の ErrorKind では
        // 分類されないため、コードで判定する
        db_err.code().is_some_and(|code| code == "23P01")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use kernel::model::{
        reservation::{ReservationAction, TimeSlot},
        role::Role,
    };

    async fn fixture_user(pool: &sqlx::PgPool, name: &str, role: &str) -> anyhow::Result<UserId> {
        let user_id = UserId::new();
        sqlx::query(
            r#"
                INSERT INTO users (user_id, user_name, email, role_id)
                SELECT $1, $2, $3, role_id FROM roles WHERE name = $4
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(format!("{name}@example.com"))
        .bind(role)
        .execute(pool)
        .await?;
        Ok(user_id)
    }

    async fn fixture_resource(
        pool: &sqlx::PgPool,
        name: &str,
        capacity: i32,
        per_user_daily_limit: bool,
    ) -> anyhow::Result<ResourceId> {
        let resource_id = ResourceId::new();
        sqlx::query(
            r#"
                INSERT INTO resources
                (resource_id, resource_name, category, description,
                capacity, per_user_daily_limit)
                VALUES ($1, $2, 'guest_parking', '', $3, $4)
            "#,
        )
        .bind(resource_id)
        .bind(name)
        .bind(capacity)
        .bind(per_user_daily_limit)
        .execute(pool)
        .await?;
        Ok(resource_id)
    }

    fn slot(start: (u32, u32), end: (u32, u32)) -> TimeSlot {
        TimeSlot::new(
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        )
        .unwrap()
    }

    fn on_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    async fn active_count(pool: &sqlx::PgPool) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reservations WHERE status IN ('pending', 'confirmed')",
        )
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_submit_creates_pending_reservation(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_id = fixture_user(&pool, "resident1", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Guest Parking Slot 1", 1, false).await?;

        let reservation_id = repo
            .submit(CreateReservation::new(
                resource_id,
                user_id,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            ))
            .await?;

        let reservation = repo.find_by_id(reservation_id).await?;
        assert_eq!(reservation.reservation_id, reservation_id);
        assert_eq!(reservation.reserved_by, user_id);
        assert_eq!(reservation.reserved_on, on_date());
        assert_eq!(reservation.slot, slot((10, 0), (12, 0)));
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.resource.resource_id, resource_id);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_submit_with_auto_confirm_policy(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), true);
        let user_id = fixture_user(&pool, "resident1", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Hall", 1, false).await?;

        let reservation_id = repo
            .submit(CreateReservation::new(
                resource_id,
                user_id,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            ))
            .await?;

        let reservation = repo.find_by_id(reservation_id).await?;
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_overlapping_reservation_is_rejected(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let user_b = fixture_user(&pool, "resident2", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Guest Parking Slot 1", 1, false).await?;

        repo.submit(CreateReservation::new(
            resource_id,
            user_a,
            on_date(),
            slot((10, 0), (12, 0)),
            None,
        ))
        .await?;

        // [10,12) と [11,13) は重なるため二件目は受け付けない
        let res = repo
            .submit(CreateReservation::new(
                resource_id,
                user_b,
                on_date(),
                slot((11, 0), (13, 0)),
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::SlotUnavailable(_))));
        assert_eq!(active_count(&pool).await?, 1);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_adjacent_reservation_succeeds(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let user_b = fixture_user(&pool, "resident2", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Guest Parking Slot 1", 1, false).await?;

        repo.submit(CreateReservation::new(
            resource_id,
            user_a,
            on_date(),
            slot((10, 0), (12, 0)),
            None,
        ))
        .await?;

        // [10,12) の直後の [12,14) は半開区間ルールにより重ならない
        repo.submit(CreateReservation::new(
            resource_id,
            user_b,
            on_date(),
            slot((12, 0), (14, 0)),
            None,
        ))
        .await?;

        assert_eq!(active_count(&pool).await?, 2);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_cancel_frees_the_slot(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let user_b = fixture_user(&pool, "resident2", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Guest Parking Slot 1", 1, false).await?;

        let reservation_id = repo
            .submit(CreateReservation::new(
                resource_id,
                user_a,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            ))
            .await?;

        // 本人による取消
        repo.transition(TransitionReservation::new(
            reservation_id,
            ReservationAction::Cancel,
            user_a,
            Role::Resident,
            None,
        ))
        .await?;

        // 取消済みの予約は競合判定から外れるため、同じ時間帯を再度予約できる
        repo.submit(CreateReservation::new(
            resource_id,
            user_b,
            on_date(),
            slot((10, 0), (12, 0)),
            None,
        ))
        .await?;

        assert_eq!(active_count(&pool).await?, 1);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_per_user_daily_limit(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let user_b = fixture_user(&pool, "resident2", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Gym", 1, true).await?;

        repo.submit(CreateReservation::new(
            resource_id,
            user_a,
            on_date(),
            slot((9, 0), (10, 0)),
            None,
        ))
        .await?;

        // 同一利用者は時間帯が重ならなくても同日二件目を取得できない
        let res = repo
            .submit(CreateReservation::new(
                resource_id,
                user_a,
                on_date(),
                slot((15, 0), (16, 0)),
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::SlotUnavailable(_))));

        // 別の利用者は予約できる
        repo.submit(CreateReservation::new(
            resource_id,
            user_b,
            on_date(),
            slot((15, 0), (16, 0)),
            None,
        ))
        .await?;
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_capacity_two_resource(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let user_b = fixture_user(&pool, "resident2", "Resident").await?;
        let user_c = fixture_user(&pool, "resident3", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Hall", 2, false).await?;

        // capacity 2 なので重なる予約を二件まで受け付ける
        repo.submit(CreateReservation::new(
            resource_id,
            user_a,
            on_date(),
            slot((10, 0), (12, 0)),
            None,
        ))
        .await?;
        repo.submit(CreateReservation::new(
            resource_id,
            user_b,
            on_date(),
            slot((11, 0), (13, 0)),
            None,
        ))
        .await?;

        let res = repo
            .submit(CreateReservation::new(
                resource_id,
                user_c,
                on_date(),
                slot((11, 30), (12, 30)),
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::SlotUnavailable(_))));
        assert_eq!(active_count(&pool).await?, 2);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_submit_rejects_inactive_resource(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_id = fixture_user(&pool, "resident1", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Pool", 1, false).await?;

        sqlx::query("UPDATE resources SET is_active = FALSE WHERE resource_id = $1")
            .bind(resource_id)
            .execute(&pool)
            .await?;

        let res = repo
            .submit(CreateReservation::new(
                resource_id,
                user_id,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::UnprocessableEntity(_))));
        assert_eq!(active_count(&pool).await?, 0);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_submit_rejects_unknown_resource_and_user(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_id = fixture_user(&pool, "resident1", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Pool", 1, false).await?;

        let res = repo
            .submit(CreateReservation::new(
                ResourceId::new(),
                user_id,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));

        let res = repo
            .submit(CreateReservation::new(
                resource_id,
                UserId::new(),
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_transition_authorization(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let admin = fixture_user(&pool, "admin1", "Admin").await?;
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let user_b = fixture_user(&pool, "resident2", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Hall", 1, false).await?;

        let reservation_id = repo
            .submit(CreateReservation::new(
                resource_id,
                user_a,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            ))
            .await?;

        // 一般住民は承認できない
        let res = repo
            .transition(TransitionReservation::new(
                reservation_id,
                ReservationAction::Confirm,
                user_a,
                Role::Resident,
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::ForbiddenOperation)));

        // 他人の予約は取り消せない
        let res = repo
            .transition(TransitionReservation::new(
                reservation_id,
                ReservationAction::Cancel,
                user_b,
                Role::Resident,
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::ForbiddenOperation)));

        // 管理者による承認
        repo.transition(TransitionReservation::new(
            reservation_id,
            ReservationAction::Confirm,
            admin,
            Role::Admin,
            None,
        ))
        .await?;
        let reservation = repo.find_by_id(reservation_id).await?;
        assert_eq!(reservation.status, ReservationStatus::Confirmed);

        // 二重承認は InvalidTransition
        let res = repo
            .transition(TransitionReservation::new(
                reservation_id,
                ReservationAction::Confirm,
                admin,
                Role::Admin,
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::InvalidTransition(_))));
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_cancel_of_rejected_is_invalid_transition(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let admin = fixture_user(&pool, "admin1", "Admin").await?;
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Hall", 1, false).await?;

        let reservation_id = repo
            .submit(CreateReservation::new(
                resource_id,
                user_a,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            ))
            .await?;

        repo.transition(TransitionReservation::new(
            reservation_id,
            ReservationAction::Reject,
            admin,
            Role::Admin,
            Some("Maintenance day".into()),
        ))
        .await?;

        // 却下理由は管理メモとして残る
        let reservation = repo.find_by_id(reservation_id).await?;
        assert_eq!(reservation.status, ReservationStatus::Rejected);
        assert_eq!(reservation.note.as_deref(), Some("Maintenance day"));

        // 終端状態からの取消は受け付けない
        let res = repo
            .transition(TransitionReservation::new(
                reservation_id,
                ReservationAction::Cancel,
                user_a,
                Role::Resident,
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::InvalidTransition(_))));
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_transition_of_unknown_reservation_is_not_found(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let admin = fixture_user(&pool, "admin1", "Admin").await?;

        let res = repo
            .transition(TransitionReservation::new(
                ReservationId::new(),
                ReservationAction::Confirm,
                admin,
                Role::Admin,
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_check_conflict_is_side_effect_free(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let user_b = fixture_user(&pool, "resident2", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Guest Parking Slot 1", 1, false).await?;

        repo.submit(CreateReservation::new(
            resource_id,
            user_a,
            on_date(),
            slot((10, 0), (12, 0)),
            None,
        ))
        .await?;

        let taken = repo
            .check_conflict(&CreateReservation::new(
                resource_id,
                user_b,
                on_date(),
                slot((11, 0), (13, 0)),
                None,
            ))
            .await?;
        assert!(matches!(taken, ConflictResult::Conflict { .. }));

        let free = repo
            .check_conflict(&CreateReservation::new(
                resource_id,
                user_b,
                on_date(),
                slot((12, 0), (14, 0)),
                None,
            ))
            .await?;
        assert_eq!(free, ConflictResult::NoConflict);

        // 診断照会では台帳は変化しない
        assert_eq!(active_count(&pool).await?, 1);
        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_concurrent_submissions_admit_exactly_one(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = ReservationRepositoryImpl::new(ConnectionPool::new(pool.clone()), false);
        let user_a = fixture_user(&pool, "resident1", "Resident").await?;
        let user_b = fixture_user(&pool, "resident2", "Resident").await?;
        let resource_id = fixture_resource(&pool, "Guest Parking Slot 1", 1, false).await?;

        // 同一の時間帯への同時申請。事前チェックは両方すり抜けうるが、
        // 排他制約によりちょうど一件だけが受け付けられる
        let (res_a, res_b) = tokio::join!(
            repo.submit(CreateReservation::new(
                resource_id,
                user_a,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            )),
            repo.submit(CreateReservation::new(
                resource_id,
                user_b,
                on_date(),
                slot((10, 0), (12, 0)),
                None,
            )),
        );

        let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let loser = if res_a.is_err() { res_a } else { res_b };
        assert!(matches!(loser, Err(AppError::SlotUnavailable(_))));

        assert_eq!(active_count(&pool).await?, 1);
        Ok(())
    }
}
