//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, ReservationId, etc.)
//! - Resource and operation enums used when reporting authorization failures
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`UserId`]: User account identifier
//! - [`RestaurantId`]: Restaurant identifier
//! - [`TableId`]: Dining table identifier
//! - [`MenuItemId`]: Menu item identifier
//! - [`ReservationId`]: Reservation identifier
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use std::fmt;
use uuid::Uuid;

use crate::api::models::users::Role;

// Type aliases for IDs
pub type UserId = Uuid;
pub type RestaurantId = Uuid;
pub type TableId = Uuid;
pub type MenuCategoryId = Uuid;
pub type MenuItemId = Uuid;
pub type ReservationId = Uuid;
pub type PreorderItemId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
// *-All means any entity of the resource, *-Own means restricted to the caller's entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadAll,
    ReadOwn,
    UpdateOwn,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Reservations,
    Restaurants,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
    /// Caller must hold this role
    Role(Role),
    /// Logical combinators
    Any(Vec<Permission>),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ReadAll | Operation::ReadOwn => write!(f, "Read"),
            Operation::UpdateOwn => write!(f, "Update"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Reservations => write!(f, "reservations"),
            Resource::Restaurants => write!(f, "restaurants"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_operation_display_collapses_scope() {
        assert_eq!(Operation::ReadOwn.to_string(), "Read");
        assert_eq!(Operation::ReadAll.to_string(), "Read");
        assert_eq!(Operation::UpdateOwn.to_string(), "Update");
    }
}
