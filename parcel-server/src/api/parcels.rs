//! Public parcel endpoints
//!
//! GET /api/parcels         : full catalogue
//! GET /api/parcels/status  : sold and reserved parcel IDs
//! GET /api/parcels/summary : remaining parcels per type

use std::sync::LazyLock;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use shared::error::AppError;
use shared::models::{Parcel, generate_all_parcels};
use shared::util::now_millis;

use crate::services::reservations;
use crate::state::AppState;

static CATALOGUE: LazyLock<Vec<Parcel>> = LazyLock::new(generate_all_parcels);

pub async fn list_parcels() -> Json<&'static [Parcel]> {
    Json(CATALOGUE.as_slice())
}

/// Availability changes with every reservation
const NO_STORE: [(header::HeaderName, &str); 1] = [(header::CACHE_CONTROL, "no-store, max-age=0")];

pub async fn parcel_status(State(state): State<AppState>) -> Result<Response, AppError> {
    let availability =
        reservations::get_sold_and_reserved_parcels(&state.pool, now_millis()).await?;
    Ok((NO_STORE, Json(availability)).into_response())
}

pub async fn parcel_summary(State(state): State<AppState>) -> Result<Response, AppError> {
    let summary = reservations::parcel_summary(&state.pool, now_millis()).await?;
    Ok((NO_STORE, Json(summary)).into_response())
}
