//! Health check endpoint

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            "unavailable"
        }
    };
    let status = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if database == "ok" { "ok" } else { "degraded" },
            "service": "parcel-server",
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
            "git_hash": option_env!("GIT_HASH").unwrap_or("dev"),
        })),
    )
}
