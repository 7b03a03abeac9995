//! Admin API handlers
//!
//! POST /api/admin/login           : exchange the admin password for a session token
//! GET  /api/admin/reservations    : filtered list, open work first
//! GET  /api/admin/reservations.csv : CSV export with the same filters
//! POST /api/admin/confirm         : mark a pending reservation as paid
//! POST /api/admin/cancel          : cancel a pending reservation
//! POST /api/admin/expire          : run the expiry sweep now

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{Reservation, ReservationAction, ReservationFilters};
use shared::util::now_millis;

use super::{ApiResult, json_body};
use crate::auth::{AdminIdentity, admin_auth::AdminSession};
use crate::export;
use crate::services::reservations;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub reservation: Reservation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpireResponse {
    pub success: bool,
    pub expired_count: u64,
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AdminSession> {
    let req = json_body(body)?;
    if !state.admin.verify_password(&req.password) {
        tracing::warn!("Admin login failed");
        return Err(AppError::invalid_credentials());
    }

    let session = state.admin.create_session().map_err(|e| {
        tracing::error!(error = %e, "Failed to sign admin session");
        AppError::internal("Failed to create session")
    })?;
    tracing::info!("Admin logged in");
    Ok(Json(session))
}

pub async fn list_reservations(
    State(state): State<AppState>,
    Query(filters): Query<ReservationFilters>,
) -> ApiResult<Vec<Reservation>> {
    let list = reservations::list_for_admin(&state.pool, &filters, now_millis()).await?;
    Ok(Json(list))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Query(filters): Query<ReservationFilters>,
) -> Result<Response, AppError> {
    let list = reservations::list_for_admin(&state.pool, &filters, now_millis()).await?;
    tracing::info!(rows = list.len(), via = identity.as_str(), "Reservations exported");

    let disposition = format!("attachment; filename=\"{}\"", export::CSV_FILENAME);
    Ok((
        [
            (header::CONTENT_TYPE, export::CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        export::reservations_csv(&list),
    )
        .into_response())
}

pub async fn confirm_reservation(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    body: Result<Json<ReservationAction>, JsonRejection>,
) -> ApiResult<TransitionResponse> {
    let action = json_body(body)?;
    let id = action.reservation_id.trim();
    let reservation = reservations::confirm_reservation(&state.pool, id, now_millis()).await?;
    tracing::info!(reservation_id = %id, via = identity.as_str(), "Admin confirmed payment");
    Ok(Json(TransitionResponse {
        success: true,
        reservation,
    }))
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    body: Result<Json<ReservationAction>, JsonRejection>,
) -> ApiResult<TransitionResponse> {
    let action = json_body(body)?;
    let id = action.reservation_id.trim();
    let reservation = reservations::cancel_reservation(&state.pool, id, now_millis()).await?;
    tracing::info!(reservation_id = %id, via = identity.as_str(), "Admin cancelled reservation");
    Ok(Json(TransitionResponse {
        success: true,
        reservation,
    }))
}

pub async fn expire_reservations(State(state): State<AppState>) -> ApiResult<ExpireResponse> {
    let expired_count = reservations::expire_reservations(&state.pool, now_millis()).await?;
    Ok(Json(ExpireResponse {
        success: true,
        expired_count,
    }))
}
