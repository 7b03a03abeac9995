//! parcel-server: reservation backend for the artificial turf fundraiser
//!
//! Visitors reserve parcels of the new pitch and pay by bank transfer:
//! - Public API: parcel catalogue, live availability, reservations
//! - Admin API: list, confirm, cancel, expire and export reservations
//! - Background sweep releasing holds that were not paid in time

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod export;
pub mod services;
pub mod state;
pub mod sweeper;
