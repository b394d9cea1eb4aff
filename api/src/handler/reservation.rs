use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use garde::Validate;
use kernel::model::{
    id::{ReservationId, ResourceId},
    reservation::{
        event::{CreateReservation, TransitionReservation},
        TimeSlot,
    },
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::{
    extractor::AuthorizedUser,
    model::reservation::{
        AvailabilityQuery, AvailabilityResponse, CreateReservationRequest, ReservationListQuery,
        ReservationResponse, ReservationsResponse, TransitionReservationRequest,
    },
};

pub async fn reserve_resource(
    user: AuthorizedUser,
    Path(resource_id): Path<ResourceId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate(&())?;

    // 時間帯の検証。長さゼロや日またぎの指定は台帳に触れる前にここで弾かれる
    let slot = TimeSlot::new(req.start_time, req.end_time)?;

    let create_reservation =
        CreateReservation::new(resource_id, user.id(), req.reserved_on, slot, req.note);

    let reservation_id = registry
        .reservation_repository()
        .submit(create_reservation)
        .await?;

    let reservation = registry
        .reservation_repository()
        .find_by_id(reservation_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse::from(reservation)),
    ))
}

// 競合の事前診断。予約は作成しない
pub async fn check_availability(
    user: AuthorizedUser,
    Path(resource_id): Path<ResourceId>,
    Query(query): Query<AvailabilityQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AvailabilityResponse>> {
    let slot = TimeSlot::new(query.start_time, query.end_time)?;
    let candidate = CreateReservation::new(resource_id, user.id(), query.reserved_on, slot, None);

    registry
        .reservation_repository()
        .check_conflict(&candidate)
        .await
        .map(AvailabilityResponse::from)
        .map(Json)
}

pub async fn show_resource_reservations(
    _user: AuthorizedUser,
    Path(resource_id): Path<ResourceId>,
    Query(query): Query<ReservationListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    registry
        .reservation_repository()
        .find_active_by_resource_and_date(resource_id, query.reserved_on)
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

pub async fn reservation_history(
    user: AuthorizedUser,
    Path(resource_id): Path<ResourceId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    // 終端状態を含む履歴は管理者のみ参照できる
    if !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }
    registry
        .reservation_repository()
        .find_history_by_resource_id(resource_id)
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

pub async fn show_my_reservations(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    registry
        .reservation_repository()
        .find_by_user_id(user.id())
        .await
        .map(ReservationsResponse::from)
        .map(Json)
}

pub async fn show_reservation(
    user: AuthorizedUser,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = registry
        .reservation_repository()
        .find_by_id(reservation_id)
        .await?;

    // 予約の詳細は本人と管理者のみ参照できる
    if reservation.reserved_by != user.id() && !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }

    Ok(Json(ReservationResponse::from(reservation)))
}

pub async fn transition_reservation(
    user: AuthorizedUser,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<TransitionReservationRequest>,
) -> AppResult<Json<ReservationResponse>> {
    req.validate(&())?;

    let transition = TransitionReservation::new(
        reservation_id,
        req.action.into(),
        user.id(),
        user.role(),
        req.reason,
    );

    registry
        .reservation_repository()
        .transition(transition)
        .await?;

    registry
        .reservation_repository()
        .find_by_id(reservation_id)
        .await
        .map(ReservationResponse::from)
        .map(Json)
}
