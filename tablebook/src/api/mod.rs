//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! All routes are nested under `/api/v1`:
//!
//! - **Restaurants** (`/restaurants`, `/restaurants/{slug}`): Public directory with tables and menus
//! - **Reservations** (`/reservations`, `/reservations/{id}`): Booking, reading and editing
//! - **Owner review** (`/reservations/{id}/status`, `/owner/restaurants/{slug}/reservations`):
//!   Status changes and per-restaurant listings
//! - **Diner history** (`/me/reservations`)
//!
//! # OpenAPI Documentation
//!
//! Endpoints are annotated with `utoipa`. The rendered reference lives at `/docs`.

pub mod handlers;
pub mod models;
