//! Shared types for the turf parcel fundraiser
//!
//! Domain types used by the server and its tests: the parcel catalogue,
//! reservation models, the unified error system and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
