//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `PgConnection` (a pooled connection or an open
//! transaction), builds and binds its queries, and returns models from
//! [`crate::db::models`]. Multi-statement writes open a nested transaction so they stay
//! atomic whatever the caller passes in.
//!
//! - [`Reservations`]: Booking lifecycle, conflict lookups and pre-order lines
//! - [`Restaurants`]: Read-only catalog queries
//! - [`Users`]: Account lookup and diner auto-creation
//!
//! ```ignore
//! use tablebook::db::handlers::{Repository, Reservations};
//!
//! let mut tx = pool.begin().await?;
//! let mut repo = Reservations::new(&mut tx);
//! let reservation = repo.get_by_id(id).await?;
//! tx.commit().await?;
//! ```

pub mod repository;
pub mod reservations;
pub mod restaurants;
pub mod users;

pub use repository::Repository;
pub use reservations::Reservations;
pub use restaurants::Restaurants;
pub use users::Users;
