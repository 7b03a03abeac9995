//! Data models
//!
//! Shared between the server and its API consumers.
//! Enums mapped to Postgres types derive `sqlx::Type` behind the `db` feature.

pub mod parcel;
pub mod reservation;

// Re-exports
pub use parcel::*;
pub use reservation::*;
