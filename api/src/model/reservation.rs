use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use garde::Validate;
use kernel::model::{
    id::{ReservationId, ResourceId, UserId},
    reservation::{
        conflict::{ConflictReason, ConflictResult},
        Reservation, ReservationAction, ReservationResource, ReservationStatus,
    },
};
use serde::{Deserialize, Serialize};

use crate::model::resource::CategoryName;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[garde(skip)]
    pub reserved_on: NaiveDate,
    #[garde(skip)]
    pub start_time: NaiveTime,
    #[garde(skip)]
    pub end_time: NaiveTime,
    #[garde(inner(length(max = 1024)))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    Confirm,
    Reject,
    Cancel,
}

impl From<ActionName> for ReservationAction {
    fn from(value: ActionName) -> Self {
        match value {
            ActionName::Confirm => Self::Confirm,
            ActionName::Reject => Self::Reject,
            ActionName::Cancel => Self::Cancel,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransitionReservationRequest {
    #[garde(skip)]
    pub action: ActionName,
    #[garde(inner(length(max = 1024)))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusName {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl From<ReservationStatus> for StatusName {
    fn from(value: ReservationStatus) -> Self {
        match value {
            ReservationStatus::Pending => Self::Pending,
            ReservationStatus::Confirmed => Self::Confirmed,
            ReservationStatus::Rejected => Self::Rejected,
            ReservationStatus::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationListQuery {
    pub reserved_on: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub reserved_on: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReasonName {
    SlotOccupied,
    PerUserDailyLimit,
}

impl From<ConflictReason> for ConflictReasonName {
    fn from(value: ConflictReason) -> Self {
        match value {
            ConflictReason::SlotOccupied => Self::SlotOccupied,
            ConflictReason::PerUserDailyLimit => Self::PerUserDailyLimit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
    pub reason: Option<ConflictReasonName>,
    pub conflicting_reservation_id: Option<ReservationId>,
}

impl From<ConflictResult> for AvailabilityResponse {
    fn from(value: ConflictResult) -> Self {
        match value {
            ConflictResult::NoConflict => Self {
                available: true,
                reason: None,
                conflicting_reservation_id: None,
            },
            ConflictResult::Conflict {
                reason,
                conflicting_reservation_id,
            } => Self {
                available: false,
                reason: Some(reason.into()),
                conflicting_reservation_id: Some(conflicting_reservation_id),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationsResponse {
    pub items: Vec<ReservationResponse>,
}

impl From<Vec<Reservation>> for ReservationsResponse {
    fn from(value: Vec<Reservation>) -> Self {
        Self {
            items: value.into_iter().map(ReservationResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub reservation_id: ReservationId,
    pub reserved_by: UserId,
    pub user_name: String,
    pub email: String,
    pub reserved_on: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: StatusName,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resource: ReservationResourceResponse,
}

impl From<Reservation> for ReservationResponse {
    fn from(value: Reservation) -> Self {
        let Reservation {
            reservation_id,
            reserved_by,
            user_name,
            email,
            reserved_on,
            slot,
            status,
            note,
            created_at,
            resource,
        } = value;
        Self {
            reservation_id,
            reserved_by,
            user_name,
            email,
            reserved_on,
            start_time: slot.start(),
            end_time: slot.end(),
            status: status.into(),
            note,
            created_at,
            resource: resource.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResourceResponse {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub category: CategoryName,
    pub capacity: i32,
    pub is_active: bool,
}

impl From<ReservationResource> for ReservationResourceResponse {
    fn from(value: ReservationResource) -> Self {
        let ReservationResource {
            resource_id,
            resource_name,
            category,
            capacity,
            is_active,
        } = value;
        Self {
            resource_id,
            resource_name,
            category: category.into(),
            capacity,
            is_active,
        }
    }
}
