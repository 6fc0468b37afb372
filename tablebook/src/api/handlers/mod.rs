//! HTTP request handlers.
//!
//! Each handler validates and deserializes the request, checks who the caller is and what
//! they may do, runs the work through the repositories in [`crate::db::handlers`], and
//! serializes the response. Errors are [`crate::errors::Error`] values, which map onto
//! status codes when returned.
//!
//! - [`reservations`]: Booking, editing, owner status changes and listings
//! - [`restaurants`]: Public restaurant directory

pub mod reservations;
pub mod restaurants;
