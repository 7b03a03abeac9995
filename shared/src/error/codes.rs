//! Unified error codes for the turf parcel service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Parcel errors
//! - 4xxx: Reservation errors
//! - 5xxx: Notification errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the frontend can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid admin password
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Too many requests from one client
    TooManyRequests = 1005,

    // ==================== 3xxx: Parcel ====================
    /// Parcel ID is not part of the field catalogue
    ParcelNotFound = 3001,
    /// Parcel is already reserved or sold
    ParcelNotAvailable = 3002,
    /// No parcel selected
    ParcelSelectionEmpty = 3003,
    /// Same parcel selected twice
    ParcelDuplicate = 3004,

    // ==================== 4xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 4001,
    /// Reservation is no longer pending
    ReservationNotPending = 4002,
    /// Reservation hold has expired
    ReservationExpired = 4003,

    // ==================== 5xxx: Notification ====================
    /// Confirmation email could not be sent
    EmailSendFailed = 5001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Parcel
            ErrorCode::ParcelNotFound => "Parcel does not exist",
            ErrorCode::ParcelNotAvailable => {
                "Some of the selected parcels are no longer available"
            }
            ErrorCode::ParcelSelectionEmpty => "Select at least one parcel",
            ErrorCode::ParcelDuplicate => "A parcel was selected more than once",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::ReservationNotPending => "Reservation is no longer pending",
            ErrorCode::ReservationExpired => "Reservation has expired",

            // Notification
            ErrorCode::EmailSendFailed => "Failed to send email",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::TooManyRequests),

            // Parcel
            3001 => Ok(ErrorCode::ParcelNotFound),
            3002 => Ok(ErrorCode::ParcelNotAvailable),
            3003 => Ok(ErrorCode::ParcelSelectionEmpty),
            3004 => Ok(ErrorCode::ParcelDuplicate),

            // Reservation
            4001 => Ok(ErrorCode::ReservationNotFound),
            4002 => Ok(ErrorCode::ReservationNotPending),
            4003 => Ok(ErrorCode::ReservationExpired),

            // Notification
            5001 => Ok(ErrorCode::EmailSendFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::ParcelNotAvailable.code(), 3002);
        assert_eq!(ErrorCode::ReservationNotPending.code(), 4002);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_round_trips_every_code() {
        let codes = [
            ErrorCode::RequiredField,
            ErrorCode::TooManyRequests,
            ErrorCode::ParcelDuplicate,
            ErrorCode::ReservationExpired,
            ErrorCode::EmailSendFailed,
            ErrorCode::DatabaseError,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(7777), Err(InvalidErrorCode(7777)));
        assert_eq!(
            InvalidErrorCode(7777).to_string(),
            "invalid error code: 7777"
        );
    }

    #[test]
    fn test_display_is_padded() {
        assert_eq!(ErrorCode::InvalidRequest.to_string(), "E0005");
        assert_eq!(ErrorCode::ParcelNotFound.to_string(), "E3001");
    }

    #[test]
    fn test_serde_uses_numeric_form() {
        let json = serde_json::to_string(&ErrorCode::ReservationNotFound).unwrap();
        assert_eq!(json, "4001");
        let code: ErrorCode = serde_json::from_str("3002").unwrap();
        assert_eq!(code, ErrorCode::ParcelNotAvailable);
        assert!(serde_json::from_str::<ErrorCode>("42").is_err());
        assert!(serde_json::from_str::<ErrorCode>("0").is_err());
    }
}
