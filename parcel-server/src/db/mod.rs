//! Database access layer

pub mod parcels;
pub mod reservations;

/// Name of the partial unique index that keeps a parcel in one live reservation
pub const ACTIVE_PARCEL_INDEX: &str = "reservation_items_active_parcel";

/// Primary key constraint of `reservations`
pub const RESERVATION_PKEY: &str = "reservations_pkey";

/// Which unique constraint, if any, an error violated
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    Some(db_err.constraint().unwrap_or_default().to_string())
}
