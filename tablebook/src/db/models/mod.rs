//! Database record models.
//!
//! Structs here map onto table rows (deriving `sqlx::FromRow`) or carry the data a
//! repository needs to write them. API models convert from these with `From` impls.
//!
//! - [`users`]: Accounts and roles
//! - [`restaurants`]: Restaurants, dining tables and menus
//! - [`reservations`]: Reservations, pre-order lines and the table conflict window

pub mod reservations;
pub mod restaurants;
pub mod users;
