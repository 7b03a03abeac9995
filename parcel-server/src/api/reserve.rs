//! POST /api/reserve: reserve parcels and email payment instructions

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::CreateReservation;
use shared::util::now_millis;

use super::{ApiResult, json_body};
use crate::email;
use crate::services::reservations;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ReserveResponse {
    pub success: bool,
    pub reservation_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub total_cents: i64,
    pub expires_at: i64,
    /// `false` when the confirmation email could not be sent
    pub email_sent: bool,
}

pub async fn create_reservation(
    State(state): State<AppState>,
    body: Result<Json<CreateReservation>, JsonRejection>,
) -> ApiResult<ReserveResponse> {
    let request = json_body(body)?;
    let reservation = reservations::create_reservation(
        &state.pool,
        request,
        now_millis(),
        state.hold_duration_ms(),
    )
    .await?;

    let email_sent =
        email::send_reservation_confirmation(&state.mailer, &state.email_settings, &reservation)
            .await;

    Ok(Json(ReserveResponse {
        success: true,
        reservation_id: reservation.id,
        total_amount: reservation.total_amount,
        total_cents: reservation.total_cents,
        expires_at: reservation.expires_at,
        email_sent,
    }))
}
