//! Authentication and authorization.
//!
//! Callers are identified by one of two methods, tried in order:
//!
//! 1. **Session cookie**: an HS256 JWT issued by the sign-in service, signed with
//!    `secret_key` and carrying the user id, email and role ([`session`]).
//! 2. **Proxy header**: a trusted upstream proxy sets a header with the user's email.
//!    Unknown emails become diners when `auto_create_users` is on.
//!
//! Handlers receive the result as an explicit [`CurrentUser`](crate::api::models::users::CurrentUser)
//! extractor ([`current_user`]). Whether that user may act on a particular reservation is
//! decided by the pure functions in [`permissions`].

pub mod current_user;
pub mod permissions;
pub mod session;
