//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries and row locking)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database record structures
//! - [`errors`]: Database-specific error types
//!
//! Writes that must be atomic with a preceding check (the table lock and conflict query
//! before a booking insert, for example) share one transaction opened by the caller:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = Reservations::new(&mut tx);
//! repo.lock_table(table_id).await?;
//! // ... conflict check, insert ...
//! tx.commit().await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
