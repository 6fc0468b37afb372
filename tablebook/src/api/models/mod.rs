//! API request and response data models.
//!
//! These structures define the public HTTP contract and are kept separate from the
//! database models in [`crate::db::models`]. Every model derives `utoipa::ToSchema`
//! so it appears in the generated OpenAPI document.
//!
//! - [`reservations`]: Booking requests, details and listings
//! - [`restaurants`]: Read-only catalog views (restaurants, tables, menus)
//! - [`users`]: Roles and the authenticated caller
//! - [`pagination`]: Shared `skip`/`limit` query parameters

pub mod pagination;
pub mod reservations;
pub mod restaurants;
pub mod users;
