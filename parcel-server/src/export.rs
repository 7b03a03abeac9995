//! CSV export of reservations

use shared::models::Reservation;
use shared::util::millis_to_rfc3339;

pub const CSV_HEADER: [&str; 16] = [
    "reservationId",
    "status",
    "createdAt",
    "expiresAt",
    "paidAt",
    "buyerName",
    "buyerEmail",
    "donorName",
    "anonymous",
    "receiptRequested",
    "totalCents",
    "totalAmount",
    "parcels",
    "buyerAddress",
    "buyerZip",
    "buyerCity",
];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CSV_FILENAME: &str = "reservations.csv";

/// Quote a field when it contains a quote, comma or line break
fn escape(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row(r: &Reservation) -> [String; 16] {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        r.id.clone(),
        r.status.as_str().to_string(),
        millis_to_rfc3339(r.created_at),
        millis_to_rfc3339(r.expires_at),
        r.paid_at.map(millis_to_rfc3339).unwrap_or_default(),
        r.buyer_name.clone(),
        r.buyer_email.clone(),
        opt(&r.donor_name),
        r.anonymous.to_string(),
        r.receipt_requested.to_string(),
        r.total_cents.to_string(),
        format!("{:.2}", r.total_amount),
        r.parcels.join("|"),
        opt(&r.buyer_address),
        opt(&r.buyer_zip),
        opt(&r.buyer_city),
    ]
}

/// Header line plus one line per reservation, each terminated by `\n`
pub fn reservations_csv(reservations: &[Reservation]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for reservation in reservations {
        let fields: Vec<String> = row(reservation).iter().map(|f| escape(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}
