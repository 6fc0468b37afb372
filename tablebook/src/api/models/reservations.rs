//! API request/response models for reservations.

use super::pagination::Pagination;
use super::restaurants::{MenuItemResponse, RestaurantDetail};
use crate::db::models::reservations::{PreorderItemDBResponse, ReservationDBResponse};
use crate::types::{MenuItemId, PreorderItemId, ReservationId, RestaurantId, TableId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Lifecycle state of a reservation.
///
/// New bookings start `PENDING`. A diner edit moves any non-cancelled booking to `EDITED`.
/// Owners may overwrite the status with any of `CONFIRMED`, `CANCELLED` or `EDITED`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "reservation_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Edited,
}

impl ReservationStatus {
    /// Parse a status submitted by an owner. `PENDING` cannot be set by hand.
    pub fn owner_settable(value: &str) -> Option<Self> {
        match value {
            "CONFIRMED" => Some(Self::Confirmed),
            "CANCELLED" => Some(Self::Cancelled),
            "EDITED" => Some(Self::Edited),
            _ => None,
        }
    }

    /// Statuses that hold a table for conflict purposes
    pub const ACTIVE: [Self; 2] = [Self::Pending, Self::Confirmed];
}

/// Distinguishes an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// One line of a food pre-order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreorderItemInput {
    #[schema(value_type = String, format = "uuid")]
    pub menu_item_id: MenuItemId,
    /// Values below 1 (or missing) are stored as 1
    #[serde(default)]
    pub quantity: Option<i32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationCreate {
    #[schema(value_type = String, format = "uuid")]
    pub restaurant_id: RestaurantId,
    pub start_time: DateTime<Utc>,
    /// Defaults to the configured booking length (90 minutes unless overridden)
    pub duration_minutes: Option<i32>,
    pub party_size: i32,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub table_id: Option<TableId>,
    pub special_requests: Option<String>,
    #[serde(default)]
    pub preorder_items: Vec<PreorderItemInput>,
}

/// Partial update. Omitted fields are left as they are; `table_id` and `special_requests`
/// may be cleared with an explicit `null`. The pre-order is always replaced: omitting
/// `preorder_items` leaves the reservation with no items.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReservationUpdate {
    pub start_time: Option<DateTime<Utc>>,
    pub party_size: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub table_id: Option<Option<TableId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub special_requests: Option<Option<String>>,
    pub preorder_items: Option<Vec<PreorderItemInput>>,
}

/// Form body of the owner status action
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StatusChangeForm {
    pub status: Option<String>,
}

/// Returned by a successful create
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationCreated {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReservationId,
    pub status: ReservationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReservationId,
    #[schema(value_type = String, format = "uuid")]
    pub restaurant_id: RestaurantId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub table_id: Option<TableId>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub party_size: i32,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreorderItemResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PreorderItemId,
    pub quantity: i32,
    pub note: Option<String>,
    pub menu_item: MenuItemResponse,
}

/// A reservation with its restaurant and resolved pre-order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: ReservationResponse,
    pub restaurant: RestaurantDetail,
    pub preorder_items: Vec<PreorderItemResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestaurantRef {
    pub name: String,
    pub slug: String,
}

/// Entry in the caller's own reservation list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyReservation {
    #[serde(flatten)]
    pub reservation: ReservationResponse,
    pub restaurant: RestaurantRef,
}

/// Entry in an owner's reservation list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerReservation {
    #[serde(flatten)]
    pub reservation: ReservationResponse,
    pub user_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerReservationsResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RestaurantId,
    pub name: String,
    pub reservations: Vec<OwnerReservation>,
}

/// Query parameters for reservation listings
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListReservationsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return reservations in this status
    pub status: Option<ReservationStatus>,
}

impl From<&ReservationDBResponse> for ReservationResponse {
    fn from(db: &ReservationDBResponse) -> Self {
        Self {
            id: db.id,
            restaurant_id: db.restaurant_id,
            user_id: db.user_id,
            table_id: db.table_id,
            start_time: db.start_time,
            duration_minutes: db.duration_minutes,
            party_size: db.party_size,
            special_requests: db.special_requests.clone(),
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<ReservationDBResponse> for MyReservation {
    fn from(db: ReservationDBResponse) -> Self {
        Self {
            reservation: ReservationResponse::from(&db),
            restaurant: RestaurantRef {
                name: db.restaurant_name,
                slug: db.restaurant_slug,
            },
        }
    }
}

impl From<ReservationDBResponse> for OwnerReservation {
    fn from(db: ReservationDBResponse) -> Self {
        Self {
            reservation: ReservationResponse::from(&db),
            user_email: db.user_email,
        }
    }
}

impl From<PreorderItemDBResponse> for PreorderItemResponse {
    fn from(db: PreorderItemDBResponse) -> Self {
        Self {
            id: db.id,
            quantity: db.quantity,
            note: db.note,
            menu_item: MenuItemResponse {
                id: db.menu_item_id,
                name: db.menu_item_name,
                description: db.menu_item_description,
                price_cents: db.menu_item_price_cents,
            },
        }
    }
}
