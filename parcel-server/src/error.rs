//! Service-layer error type
//!
//! `ServiceError` sits between the database layer (`sqlx::Error`, `BoxError`)
//! and the API layer (`AppError`) so handlers can use `?` throughout.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// - `Db`: database or infrastructure failure (logged, reported as InternalError)
/// - `App`: business-rule error, passed through to the client
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_db_error_is_hidden_from_client() {
        let err: AppError = ServiceError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("no rows"));
    }

    #[test]
    fn test_app_error_passes_through() {
        let err: AppError =
            ServiceError::from(AppError::reservation_not_found("RES-0000AAAA")).into();
        assert_eq!(err.code, ErrorCode::ReservationNotFound);
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
    }
}
