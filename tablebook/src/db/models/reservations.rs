//! Database models for reservations and their pre-order lines.

use crate::api::models::reservations::{PreorderItemInput, ReservationCreate, ReservationStatus, ReservationUpdate};
use crate::config::ConflictCheck;
use crate::types::{MenuItemId, PreorderItemId, ReservationId, RestaurantId, TableId, UserId};
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

/// One pre-order line to insert. Quantity is already clamped to at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreorderItemDBRequest {
    pub menu_item_id: MenuItemId,
    pub quantity: i32,
    pub note: Option<String>,
}

impl From<&PreorderItemInput> for PreorderItemDBRequest {
    fn from(input: &PreorderItemInput) -> Self {
        Self {
            menu_item_id: input.menu_item_id,
            quantity: input.quantity.unwrap_or(1).max(1),
            note: input.note.clone(),
        }
    }
}

/// Database request for creating a reservation
#[derive(Debug, Clone)]
pub struct ReservationCreateDBRequest {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub table_id: Option<TableId>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub party_size: i32,
    pub special_requests: Option<String>,
    pub preorder_items: Vec<PreorderItemDBRequest>,
}

impl ReservationCreateDBRequest {
    pub fn new(user_id: UserId, create: &ReservationCreate, default_duration_minutes: i32) -> Self {
        Self {
            user_id,
            restaurant_id: create.restaurant_id,
            table_id: create.table_id,
            start_time: create.start_time,
            duration_minutes: create.duration_minutes.unwrap_or(default_duration_minutes),
            party_size: create.party_size,
            special_requests: create.special_requests.clone(),
            preorder_items: create.preorder_items.iter().map(Into::into).collect(),
        }
    }
}

/// Database request for editing a reservation. The pre-order is always replaced.
#[derive(Debug, Clone, Default)]
pub struct ReservationUpdateDBRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub party_size: Option<i32>,
    pub table_id: Option<Option<TableId>>,
    pub special_requests: Option<Option<String>>,
    pub preorder_items: Vec<PreorderItemDBRequest>,
}

impl From<&ReservationUpdate> for ReservationUpdateDBRequest {
    fn from(update: &ReservationUpdate) -> Self {
        Self {
            start_time: update.start_time,
            party_size: update.party_size,
            table_id: update.table_id,
            special_requests: update.special_requests.clone(),
            preorder_items: update
                .preorder_items
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// A reservation row, joined with the restaurant name/slug and the diner's email
#[derive(Debug, Clone, FromRow)]
pub struct ReservationDBResponse {
    pub id: ReservationId,
    pub restaurant_id: RestaurantId,
    pub user_id: UserId,
    pub table_id: Option<TableId>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub party_size: i32,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub restaurant_name: String,
    pub restaurant_slug: String,
    pub user_email: String,
}

/// A pre-order line with its menu item resolved
#[derive(Debug, Clone, FromRow)]
pub struct PreorderItemDBResponse {
    pub id: PreorderItemId,
    pub reservation_id: ReservationId,
    pub menu_item_id: MenuItemId,
    pub quantity: i32,
    pub note: Option<String>,
    pub menu_item_name: String,
    pub menu_item_description: Option<String>,
    pub menu_item_price_cents: i32,
}

/// The ownership chain of a reservation: who booked it and who owns the restaurant
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct ReservationAccess {
    pub reservation_id: ReservationId,
    pub diner_id: UserId,
    pub restaurant_id: RestaurantId,
    pub owner_id: UserId,
    pub status: ReservationStatus,
}

/// The slot a new booking wants on a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictWindow {
    pub table_id: TableId,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub mode: ConflictCheck,
}

impl ConflictWindow {
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    /// End of the requested slot, `start + duration`. `None` past the representable range.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.start_time.checked_add_signed(self.duration())
    }

    /// Exclusive bounds on an existing booking's start time for the approximate check:
    /// `(start - duration, start + duration)`.
    pub fn approximate_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let lower = self.start_time.checked_sub_signed(self.duration())?;
        Some((lower, self.end_time()?))
    }

    /// The `(lower, upper)` pair the configured check compares against, or `None` when the
    /// slot cannot be represented.
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self.mode {
            ConflictCheck::Approximate => self.approximate_bounds(),
            ConflictCheck::Interval => Some((self.start_time, self.end_time()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn window(duration_minutes: i32) -> ConflictWindow {
        ConflictWindow {
            table_id: Uuid::new_v4(),
            start_time: Utc.with_ymd_and_hms(2025, 6, 1, 19, 0, 0).unwrap(),
            duration_minutes,
            mode: ConflictCheck::Approximate,
        }
    }

    #[test]
    fn test_approximate_bounds_span_one_duration_each_side() {
        let (lower, upper) = window(90).approximate_bounds().unwrap();
        assert_eq!(lower, Utc.with_ymd_and_hms(2025, 6, 1, 17, 30, 0).unwrap());
        assert_eq!(upper, Utc.with_ymd_and_hms(2025, 6, 1, 20, 30, 0).unwrap());
    }

    #[test]
    fn test_interval_bounds_start_at_requested_time() {
        let slot = ConflictWindow {
            mode: ConflictCheck::Interval,
            ..window(30)
        };
        let (lower, upper) = slot.bounds().unwrap();
        assert_eq!(lower, slot.start_time);
        assert_eq!(upper, Utc.with_ymd_and_hms(2025, 6, 1, 19, 30, 0).unwrap());
    }

    #[test]
    fn test_bounds_past_representable_range_are_none() {
        let far_future = ConflictWindow {
            start_time: "+262000-01-01T00:00:00Z".parse().unwrap(),
            ..window(i32::MAX)
        };
        assert_eq!(far_future.end_time(), None);
        assert_eq!(far_future.approximate_bounds(), None);
        assert_eq!(far_future.bounds(), None);

        let far_past = ConflictWindow {
            start_time: DateTime::<Utc>::MIN_UTC,
            ..window(1)
        };
        assert_eq!(far_past.approximate_bounds(), None);
        assert!(
            ConflictWindow {
                mode: ConflictCheck::Interval,
                ..far_past
            }
            .bounds()
            .is_some()
        );
    }

    #[test]
    fn test_preorder_quantity_is_clamped() {
        let menu_item_id = Uuid::new_v4();
        for (quantity, expected) in [(Some(0), 1), (Some(-3), 1), (None, 1), (Some(4), 4)] {
            let input = PreorderItemInput {
                menu_item_id,
                quantity,
                note: None,
            };
            assert_eq!(PreorderItemDBRequest::from(&input).quantity, expected);
        }
    }

    #[test]
    fn test_update_without_items_clears_preorder() {
        let update = ReservationUpdate {
            party_size: Some(4),
            ..Default::default()
        };
        let request = ReservationUpdateDBRequest::from(&update);
        assert!(request.preorder_items.is_empty());
        assert_eq!(request.party_size, Some(4));
        assert_eq!(request.table_id, None);
    }
}
