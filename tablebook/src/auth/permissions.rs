//! Relationship checks for reservations.
//!
//! Access to a reservation follows the chain reservation → restaurant → owner. Handlers
//! resolve that chain with `Reservations::get_access` and ask the functions here, which
//! never touch the database.

use crate::{
    api::models::users::{CurrentUser, Role},
    db::models::reservations::ReservationAccess,
    errors::Error,
    types::{Operation, Permission, Resource},
};

/// The caller booked this reservation
pub fn is_diner(user: &CurrentUser, access: &ReservationAccess) -> bool {
    user.id == access.diner_id
}

/// The caller owns the restaurant the reservation is at
pub fn is_restaurant_owner(user: &CurrentUser, access: &ReservationAccess) -> bool {
    user.is_owner() && user.id == access.owner_id
}

/// Diners see their own bookings, owners see bookings at their restaurants
pub fn can_read_reservation(user: &CurrentUser, access: &ReservationAccess) -> bool {
    is_diner(user, access) || is_restaurant_owner(user, access)
}

/// Only the diner may edit; owners change status instead
pub fn can_edit_reservation(user: &CurrentUser, access: &ReservationAccess) -> bool {
    is_diner(user, access)
}

pub fn can_change_status(user: &CurrentUser, access: &ReservationAccess) -> bool {
    is_restaurant_owner(user, access)
}

/// Reject callers without the OWNER role
pub fn require_owner(user: &CurrentUser) -> Result<(), Error> {
    if user.is_owner() {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Role(Role::Owner),
            action: Operation::ReadAll,
            resource: Resource::Restaurants.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::reservations::ReservationStatus;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            display_name: None,
            role,
        }
    }

    fn access(diner: &CurrentUser, owner: &CurrentUser) -> ReservationAccess {
        ReservationAccess {
            reservation_id: Uuid::new_v4(),
            diner_id: diner.id,
            restaurant_id: Uuid::new_v4(),
            owner_id: owner.id,
            status: ReservationStatus::Pending,
        }
    }

    #[test]
    fn test_diner_can_read_and_edit_but_not_change_status() {
        let diner = user(Role::Client);
        let owner = user(Role::Owner);
        let access = access(&diner, &owner);

        assert!(can_read_reservation(&diner, &access));
        assert!(can_edit_reservation(&diner, &access));
        assert!(!can_change_status(&diner, &access));
    }

    #[test]
    fn test_owner_can_read_and_change_status_but_not_edit() {
        let diner = user(Role::Client);
        let owner = user(Role::Owner);
        let access = access(&diner, &owner);

        assert!(can_read_reservation(&owner, &access));
        assert!(can_change_status(&owner, &access));
        assert!(!can_edit_reservation(&owner, &access));
    }

    #[test]
    fn test_strangers_have_no_access() {
        let diner = user(Role::Client);
        let owner = user(Role::Owner);
        let access = access(&diner, &owner);

        let other_owner = user(Role::Owner);
        assert!(!can_read_reservation(&other_owner, &access));
        assert!(!can_change_status(&other_owner, &access));

        let other_diner = user(Role::Client);
        assert!(!can_read_reservation(&other_diner, &access));
        assert!(!can_edit_reservation(&other_diner, &access));
    }

    #[test]
    fn test_owner_role_is_required_for_owner_relationship() {
        // A restaurant whose owner_id points at a CLIENT account grants nothing through ownership
        let diner = user(Role::Client);
        let demoted = user(Role::Client);
        let access = access(&diner, &demoted);

        assert!(!can_change_status(&demoted, &access));
        assert!(!can_read_reservation(&demoted, &access));
    }

    #[test]
    fn test_require_owner() {
        assert!(require_owner(&user(Role::Owner)).is_ok());

        let err = require_owner(&user(Role::Client)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
