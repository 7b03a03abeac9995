//! HTTP API routes

pub mod admin;
pub mod health;
pub mod parcels;
pub mod reserve;

use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use http::{HeaderName, HeaderValue};
use shared::error::AppError;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::admin_auth::admin_auth_middleware;
use crate::auth::rate_limit::{login_rate_limit, reserve_rate_limit};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// UUID v4 request IDs
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Unwrap a JSON body, reporting malformed input in the API error envelope
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::invalid_request(rejection.body_text()))
}

/// Create the application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let reserve = Router::new()
        .route("/api/reserve", post(reserve::create_reservation))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            reserve_rate_limit,
        ));

    let login = Router::new()
        .route("/api/admin/login", post(admin::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let admin = Router::new()
        .route("/api/admin/reservations", get(admin::list_reservations))
        .route("/api/admin/reservations.csv", get(admin::export_csv))
        .route("/api/admin/confirm", post(admin::confirm_reservation))
        .route("/api/admin/cancel", post(admin::cancel_reservation))
        .route("/api/admin/expire", post(admin::expire_reservations))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/parcels", get(parcels::list_parcels))
        .route("/api/parcels/status", get(parcels::parcel_status))
        .route("/api/parcels/summary", get(parcels::parcel_summary))
        .merge(reserve)
        .merge(login)
        .merge(admin)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}
