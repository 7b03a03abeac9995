//! Reservation Model

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use super::parcel::{Parcel, parcel_by_id};
use crate::error::{AppError, ErrorCode};

/// Reservation lifecycle: `pending → paid | expired | cancelled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "reservation_status", rename_all = "lowercase")
)]
pub enum ReservationStatus {
    Pending,
    Paid,
    Expired,
    Cancelled,
}

impl ReservationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Position in the admin list (open work first)
    pub const fn sort_rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Paid => 1,
            Self::Expired => 2,
            Self::Cancelled => 3,
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("Unknown reservation status: {other}"),
            )),
        }
    }
}

/// Reservation as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub parcels: Vec<String>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_address: Option<String>,
    pub buyer_city: Option<String>,
    pub buyer_zip: Option<String>,
    /// Name shown on the supporter board (defaults to the buyer)
    pub donor_name: Option<String>,
    /// Hide the donor on public listings
    pub anonymous: bool,
    /// Buyer asked for a donation receipt
    pub receipt_requested: bool,
    pub total_cents: i64,
    /// `total_cents` in euros
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: ReservationStatus,
    pub created_at: i64,
    pub expires_at: i64,
    pub paid_at: Option<i64>,
}

/// Euro amount for a cent value
pub fn cents_to_euros(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Admin list order: status rank, then newest first
pub fn sort_for_admin(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| {
        a.status
            .sort_rank()
            .cmp(&b.status.sort_rank())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Create reservation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateReservation {
    pub parcels: Vec<String>,
    #[validate(length(min = 2, message = "Please enter your name"))]
    pub buyer_name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub buyer_email: String,
    #[validate(length(min = 5, message = "Please enter your street address"))]
    #[serde(default)]
    pub buyer_address: Option<String>,
    #[validate(length(min = 2, message = "Please enter your city"))]
    #[serde(default)]
    pub buyer_city: Option<String>,
    #[validate(length(min = 4, message = "Please enter your postal code"))]
    #[serde(default)]
    pub buyer_zip: Option<String>,
    #[validate(length(min = 2, max = 80, message = "Donor name must be 2 to 80 characters"))]
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub receipt_requested: bool,
}

/// Field order used to pick the message reported to the buyer
const FIELD_ORDER: [&str; 6] = [
    "buyer_name",
    "buyer_email",
    "buyer_address",
    "buyer_city",
    "buyer_zip",
    "donor_name",
];

fn first_validation_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    for name in FIELD_ORDER {
        if let Some(err) = fields.get(name).and_then(|errs| errs.first()) {
            return err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {name}"));
        }
    }
    ErrorCode::ValidationFailed.message().to_string()
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateReservation {
    /// Trim text fields and drop empty optionals
    pub fn normalized(self) -> Self {
        Self {
            parcels: self.parcels.into_iter().map(|p| p.trim().to_string()).collect(),
            buyer_name: self.buyer_name.trim().to_string(),
            buyer_email: self.buyer_email.trim().to_string(),
            buyer_address: clean(self.buyer_address),
            buyer_city: clean(self.buyer_city),
            buyer_zip: clean(self.buyer_zip),
            donor_name: clean(self.donor_name),
            anonymous: self.anonymous,
            receipt_requested: self.receipt_requested,
        }
    }

    /// Validate the payload and resolve the selected parcels.
    ///
    /// Parcel order is preserved. Fails on the first problem found.
    pub fn check(&self) -> Result<Vec<Parcel>, AppError> {
        if self.parcels.is_empty() {
            return Err(AppError::new(ErrorCode::ParcelSelectionEmpty));
        }

        self.validate()
            .map_err(|e| AppError::validation(first_validation_message(&e)))?;

        if self.receipt_requested {
            let missing = [
                ("buyer_address", &self.buyer_address),
                ("buyer_city", &self.buyer_city),
                ("buyer_zip", &self.buyer_zip),
            ]
            .into_iter()
            .find(|(_, v)| v.is_none());
            if let Some((field, _)) = missing {
                return Err(AppError::with_message(
                    ErrorCode::RequiredField,
                    "A donation receipt requires a full postal address",
                )
                .with_detail("field", field));
            }
        }

        let mut seen = HashSet::with_capacity(self.parcels.len());
        let mut parcels = Vec::with_capacity(self.parcels.len());
        for id in &self.parcels {
            if !seen.insert(id.as_str()) {
                return Err(AppError::new(ErrorCode::ParcelDuplicate).with_detail("parcel", id.clone()));
            }
            parcels.push(parcel_by_id(id).ok_or_else(|| AppError::unknown_parcel(id.clone()))?);
        }

        Ok(parcels)
    }
}

/// Reservation transition payload (admin confirm / cancel)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationAction {
    pub reservation_id: String,
}

/// Admin list / export filters (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationFilters {
    /// Unknown values are ignored rather than rejected
    #[serde(default)]
    pub status: Option<String>,
    /// Free text: reservation ID, buyer name or email, donor name
    #[serde(default)]
    pub q: Option<String>,
    /// Inclusive start (`YYYY-MM-DD` or RFC 3339)
    #[serde(default)]
    pub from: Option<String>,
    /// Inclusive end (`YYYY-MM-DD` or RFC 3339)
    #[serde(default)]
    pub to: Option<String>,
}

/// Filters resolved into query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFilters {
    pub status: Option<ReservationStatus>,
    /// Lowercased search text
    pub search: Option<String>,
    /// `created_at >= from_ms`
    pub from_ms: Option<i64>,
    /// `created_at < until_ms`
    pub until_ms: Option<i64>,
}

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

enum Bound {
    Start,
    End,
}

fn parse_bound(field: &str, raw: &str, bound: Bound) -> Result<i64, AppError> {
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let start = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .ok_or_else(|| AppError::validation(format!("Invalid date in {field}")))?;
        return Ok(match bound {
            Bound::Start => start,
            Bound::End => start + DAY_MS,
        });
    }

    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            let ms = dt.timestamp_millis();
            match bound {
                Bound::Start => ms,
                Bound::End => ms + 1,
            }
        })
        .map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("{field} must be YYYY-MM-DD or an RFC 3339 timestamp"),
            )
            .with_detail("field", field)
        })
}

impl ReservationFilters {
    pub fn resolve(&self) -> Result<ResolvedFilters, AppError> {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let status = non_empty(&self.status).and_then(|s| s.parse().ok());
        let search = non_empty(&self.q).map(|s| s.to_lowercase());
        let from_ms = non_empty(&self.from)
            .map(|s| parse_bound("from", &s, Bound::Start))
            .transpose()?;
        let until_ms = non_empty(&self.to)
            .map(|s| parse_bound("to", &s, Bound::End))
            .transpose()?;

        Ok(ResolvedFilters {
            status,
            search,
            from_ms,
            until_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(parcels: &[&str]) -> CreateReservation {
        CreateReservation {
            parcels: parcels.iter().map(|p| p.to_string()).collect(),
            buyer_name: "Max Mustermann".into(),
            buyer_email: "max@beispiel.de".into(),
            ..Default::default()
        }
    }

    fn reservation(id: &str, status: ReservationStatus, created_at: i64) -> Reservation {
        Reservation {
            id: id.into(),
            parcels: vec!["kickoff".into()],
            buyer_name: "Erika Musterfrau".into(),
            buyer_email: "erika@beispiel.de".into(),
            buyer_address: None,
            buyer_city: None,
            buyer_zip: None,
            donor_name: Some("Familie Muster".into()),
            anonymous: false,
            receipt_requested: false,
            total_cents: 50_000,
            total_amount: cents_to_euros(50_000),
            status,
            created_at,
            expires_at: created_at + DAY_MS,
            paid_at: None,
        }
    }

    #[test]
    fn test_status_round_trip_and_rank() {
        for s in ["pending", "paid", "expired", "cancelled"] {
            let status: ReservationStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!("confirmed".parse::<ReservationStatus>().is_err());
        assert!(ReservationStatus::Pending.sort_rank() < ReservationStatus::Paid.sort_rank());
        assert!(ReservationStatus::Expired.sort_rank() < ReservationStatus::Cancelled.sort_rank());
    }

    #[test]
    fn test_check_resolves_parcels_in_order() {
        let parcels = request(&["kickoff", "field-1-1"]).check().unwrap();
        let ids: Vec<_> = parcels.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["kickoff", "field-1-1"]);
    }

    #[test]
    fn test_check_rejects_empty_selection() {
        let err = request(&[]).check().unwrap_err();
        assert_eq!(err.code, ErrorCode::ParcelSelectionEmpty);
    }

    #[test]
    fn test_check_rejects_duplicates_and_unknown() {
        let err = request(&["kickoff", "kickoff"]).check().unwrap_err();
        assert_eq!(err.code, ErrorCode::ParcelDuplicate);

        let err = request(&["field-0-0", "field-99-99"]).check().unwrap_err();
        assert_eq!(err.code, ErrorCode::ParcelNotFound);
    }

    #[test]
    fn test_check_reports_first_field_error() {
        let mut req = request(&["kickoff"]);
        req.buyer_name = "M".into();
        req.buyer_email = "not-an-email".into();
        let err = req.check().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Please enter your name");

        let mut req = request(&["kickoff"]);
        req.buyer_email = "not-an-email".into();
        assert_eq!(
            req.check().unwrap_err().message,
            "Please enter a valid email address"
        );
    }

    #[test]
    fn test_check_validates_optional_fields_only_when_present() {
        let mut req = request(&["kickoff"]);
        req.buyer_zip = Some("123".into());
        assert_eq!(
            req.check().unwrap_err().message,
            "Please enter your postal code"
        );

        req.buyer_zip = None;
        assert!(req.check().is_ok());
    }

    #[test]
    fn test_receipt_requires_address() {
        let mut req = request(&["kickoff"]);
        req.receipt_requested = true;
        req.buyer_address = Some("Apenrader Str. 42".into());
        req.buyer_city = Some("Köln".into());
        let err = req.check().unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert_eq!(err.details.unwrap()["field"], "buyer_zip");

        let mut req = request(&["kickoff"]);
        req.receipt_requested = true;
        req.buyer_address = Some("Apenrader Str. 42".into());
        req.buyer_city = Some("Köln".into());
        req.buyer_zip = Some("50825".into());
        assert!(req.check().is_ok());
    }

    #[test]
    fn test_normalized_trims_and_drops_blanks() {
        let req = CreateReservation {
            parcels: vec![" kickoff ".into()],
            buyer_name: "  Max ".into(),
            buyer_email: " max@beispiel.de ".into(),
            buyer_address: Some("   ".into()),
            donor_name: Some(" Max & Erika ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(req.parcels, ["kickoff"]);
        assert_eq!(req.buyer_name, "Max");
        assert_eq!(req.buyer_email, "max@beispiel.de");
        assert_eq!(req.buyer_address, None);
        assert_eq!(req.donor_name.as_deref(), Some("Max & Erika"));
    }

    #[test]
    fn test_sort_for_admin() {
        let mut list = vec![
            reservation("A", ReservationStatus::Paid, 3),
            reservation("B", ReservationStatus::Pending, 1),
            reservation("C", ReservationStatus::Cancelled, 9),
            reservation("D", ReservationStatus::Pending, 5),
            reservation("E", ReservationStatus::Expired, 2),
        ];
        sort_for_admin(&mut list);
        let ids: Vec<_> = list.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["D", "B", "A", "E", "C"]);
    }

    #[test]
    fn test_total_amount_serializes_as_number() {
        let json = serde_json::to_value(reservation("A", ReservationStatus::Pending, 0)).unwrap();
        assert_eq!(json["total_amount"], serde_json::json!(500.0));
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_filters_resolve_dates() {
        let filters = ReservationFilters {
            status: Some("paid".into()),
            q: Some("  Muster ".into()),
            from: Some("2025-01-15".into()),
            to: Some("2025-01-15".into()),
        }
        .resolve()
        .unwrap();
        assert_eq!(filters.status, Some(ReservationStatus::Paid));
        assert_eq!(filters.search.as_deref(), Some("muster"));
        assert_eq!(filters.from_ms, Some(1_736_899_200_000));
        assert_eq!(filters.until_ms, Some(1_736_899_200_000 + DAY_MS));
    }

    #[test]
    fn test_filters_ignore_unknown_status_and_reject_bad_dates() {
        let filters = ReservationFilters {
            status: Some("confirmed".into()),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(filters, ResolvedFilters::default());

        let err = ReservationFilters {
            from: Some("15.01.2025".into()),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }
}
