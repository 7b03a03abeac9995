//! Error types and API response structures

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error type every handler returns:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (offending parcel IDs, current status, ...)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Create an invalid token error
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    /// Create a token expired error
    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    /// Create a rate-limited error
    pub fn too_many_requests() -> Self {
        Self::new(ErrorCode::TooManyRequests)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Parcels that are already held by another reservation
    pub fn parcels_unavailable(parcel_ids: &[String]) -> Self {
        let err = Self::new(ErrorCode::ParcelNotAvailable);
        if parcel_ids.is_empty() {
            err
        } else {
            err.with_detail("parcels", parcel_ids.to_vec())
        }
    }

    /// Parcel ID outside the field catalogue
    pub fn unknown_parcel(parcel_id: impl Into<String>) -> Self {
        let id = parcel_id.into();
        Self::with_message(ErrorCode::ParcelNotFound, format!("Unknown parcel: {id}"))
            .with_detail("parcel", id)
    }

    /// Reservation with the given ID does not exist
    pub fn reservation_not_found(id: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReservationNotFound).with_detail("reservation_id", id.into())
    }

    /// Status transition attempted on a reservation that left `pending`
    pub fn reservation_not_pending(status: impl Into<String>) -> Self {
        let status = status.into();
        Self::with_message(
            ErrorCode::ReservationNotPending,
            format!("Reservation is no longer pending (status: {status})"),
        )
        .with_detail("status", status)
    }
}

/// Error body returned by every endpoint
///
/// `{ "code": 3002, "message": "...", "details": { ... } }`. Successful
/// responses are the endpoint's own JSON type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Numeric [`ErrorCode`]
    pub code: u16,
    /// Human-readable message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl ApiResponse {
    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ApiResponse::error(&self);

        let category = self.code.category();
        if matches!(category, ErrorCategory::System) {
            tracing::error!(
                code = %self.code,
                category = category.name(),
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::ReservationNotFound);
        assert_eq!(err.code, ErrorCode::ReservationNotFound);
        assert_eq!(err.message, "Reservation not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "buyer_email")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "buyer_email");
        assert_eq!(details.get("reason").unwrap(), "required");
    }

    #[test]
    fn test_parcels_unavailable_lists_ids() {
        let err = AppError::parcels_unavailable(&["kickoff".to_string()]);
        assert_eq!(err.code, ErrorCode::ParcelNotAvailable);
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
        let details = err.details.unwrap();
        assert_eq!(details["parcels"], serde_json::json!(["kickoff"]));

        let bare = AppError::parcels_unavailable(&[]);
        assert!(bare.details.is_none());
    }

    #[test]
    fn test_reservation_not_pending_carries_status() {
        let err = AppError::reservation_not_pending("paid");
        assert_eq!(err.code, ErrorCode::ReservationNotPending);
        assert_eq!(err.message, "Reservation is no longer pending (status: paid)");
        assert_eq!(err.details.unwrap()["status"], "paid");
    }

    #[test]
    fn test_unknown_parcel_message() {
        let err = AppError::unknown_parcel("field-99-0");
        assert_eq!(err.code, ErrorCode::ParcelNotFound);
        assert_eq!(err.message, "Unknown parcel: field-99-0");
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::ReservationNotFound, "nope");
        assert_eq!(format!("{}", err), "nope");
    }

    #[test]
    fn test_api_response_error() {
        let err = AppError::reservation_not_found("RES-ABCD1234");
        let response = ApiResponse::error(&err);

        assert_eq!(response.code, 4001);
        assert_eq!(response.message, "Reservation not found");
        assert_eq!(response.details.unwrap()["reservation_id"], "RES-ABCD1234");
    }

    #[test]
    fn test_api_response_serialize_skips_empty_details() {
        let response = ApiResponse::error(&AppError::new(ErrorCode::InternalError));
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"code":9001,"message":"Internal server error"}"#);
    }

    #[tokio::test]
    async fn test_into_response_status_and_body() {
        use axum::response::IntoResponse;
        use http_body_util::BodyExt;

        let response = AppError::parcels_unavailable(&["kickoff".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 3002);
        assert_eq!(body["details"]["parcels"], serde_json::json!(["kickoff"]));
    }
}
