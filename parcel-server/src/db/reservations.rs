//! Reservation and reservation-item tables
//!
//! A parcel is held while its `reservation_items` row is `active`. The
//! partial unique index on `(parcel_id) WHERE active` is the single guard
//! against double booking; every transition that leaves `pending` clears
//! `active` in the same statement.

use shared::models::{Reservation, ReservationStatus, ResolvedFilters, cents_to_euros};
use sqlx::{PgConnection, PgPool};

/// Everything needed to insert a new pending reservation
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub id: String,
    pub parcels: Vec<String>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_address: Option<String>,
    pub buyer_city: Option<String>,
    pub buyer_zip: Option<String>,
    pub donor_name: Option<String>,
    pub anonymous: bool,
    pub receipt_requested: bool,
    pub total_cents: i64,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: String,
    buyer_name: String,
    buyer_email: String,
    buyer_address: Option<String>,
    buyer_city: Option<String>,
    buyer_zip: Option<String>,
    donor_name: Option<String>,
    anonymous: bool,
    receipt_requested: bool,
    total_cents: i64,
    status: ReservationStatus,
    created_at: i64,
    expires_at: i64,
    paid_at: Option<i64>,
    parcels: Vec<String>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: row.id,
            parcels: row.parcels,
            buyer_name: row.buyer_name,
            buyer_email: row.buyer_email,
            buyer_address: row.buyer_address,
            buyer_city: row.buyer_city,
            buyer_zip: row.buyer_zip,
            donor_name: row.donor_name,
            anonymous: row.anonymous,
            receipt_requested: row.receipt_requested,
            total_cents: row.total_cents,
            total_amount: cents_to_euros(row.total_cents),
            status: row.status,
            created_at: row.created_at,
            expires_at: row.expires_at,
            paid_at: row.paid_at,
        }
    }
}

const SELECT_RESERVATION: &str = r#"
    SELECT r.id, r.buyer_name, r.buyer_email, r.buyer_address, r.buyer_city, r.buyer_zip,
           r.donor_name, r.anonymous, r.receipt_requested, r.total_cents, r.status,
           r.created_at, r.expires_at, r.paid_at,
           ARRAY(
               SELECT i.parcel_id FROM reservation_items i
               WHERE i.reservation_id = r.id
               ORDER BY i.position
           ) AS parcels
    FROM reservations r
"#;

// ── Create ──

/// Insert a pending reservation and its active items.
///
/// Runs on the caller's connection so it can share a transaction with the
/// expiry sweep. A unique violation on [`super::ACTIVE_PARCEL_INDEX`] means
/// a parcel is already held; one on [`super::RESERVATION_PKEY`] means the
/// generated ID collided.
pub async fn insert(conn: &mut PgConnection, new: &NewReservation) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO reservations (
            id, buyer_name, buyer_email, buyer_address, buyer_city, buyer_zip,
            donor_name, anonymous, receipt_requested, total_cents, status,
            created_at, expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', $11, $12)
        "#,
    )
    .bind(&new.id)
    .bind(&new.buyer_name)
    .bind(&new.buyer_email)
    .bind(&new.buyer_address)
    .bind(&new.buyer_city)
    .bind(&new.buyer_zip)
    .bind(&new.donor_name)
    .bind(new.anonymous)
    .bind(new.receipt_requested)
    .bind(new.total_cents)
    .bind(new.created_at)
    .bind(new.expires_at)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO reservation_items (reservation_id, parcel_id, position, active)
        SELECT $1, t.parcel_id, (t.ord - 1)::int, TRUE
        FROM UNNEST($2::text[]) WITH ORDINALITY AS t(parcel_id, ord)
        "#,
    )
    .bind(&new.id)
    .bind(&new.parcels)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// ── Read ──

pub async fn find(pool: &PgPool, id: &str) -> Result<Option<Reservation>, sqlx::Error> {
    let sql = format!("{SELECT_RESERVATION} WHERE r.id = $1");
    let row: Option<ReservationRow> = sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(Reservation::from))
}

/// Reservations matching `filters`, newest first
pub async fn list(
    pool: &PgPool,
    filters: &ResolvedFilters,
) -> Result<Vec<Reservation>, sqlx::Error> {
    let pattern = filters
        .search
        .as_deref()
        .map(|q| format!("%{}%", escape_like(q)));

    let sql = format!(
        r#"{SELECT_RESERVATION}
        WHERE ($1::reservation_status IS NULL OR r.status = $1)
          AND ($2::bigint IS NULL OR r.created_at >= $2)
          AND ($3::bigint IS NULL OR r.created_at < $3)
          AND ($4::text IS NULL
               OR LOWER(r.id) LIKE $4 ESCAPE '\'
               OR LOWER(r.buyer_name) LIKE $4 ESCAPE '\'
               OR LOWER(r.buyer_email) LIKE $4 ESCAPE '\'
               OR LOWER(COALESCE(r.donor_name, '')) LIKE $4 ESCAPE '\')
        ORDER BY r.created_at DESC, r.id
        "#
    );

    let rows: Vec<ReservationRow> = sqlx::query_as(&sql)
        .bind(filters.status)
        .bind(filters.from_ms)
        .bind(filters.until_ms)
        .bind(pattern)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Reservation::from).collect())
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Parcel holds that still count at `now`: paid reservations, and pending
/// ones whose hold has not lapsed.
pub async fn active_holdings(
    pool: &PgPool,
    now: i64,
) -> Result<Vec<(String, ReservationStatus)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT i.parcel_id, r.status
        FROM reservation_items i
        JOIN reservations r ON r.id = i.reservation_id
        WHERE i.active
          AND (r.status = 'paid' OR (r.status = 'pending' AND r.expires_at >= $1))
        ORDER BY i.parcel_id
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await
}

/// Which of `parcel_ids` are held by a live reservation
pub async fn held_parcels(
    conn: &mut PgConnection,
    parcel_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT parcel_id FROM reservation_items
        WHERE active AND parcel_id = ANY($1)
        ORDER BY parcel_id
        "#,
    )
    .bind(parcel_ids)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

// ── Transitions ──

/// Mark pending reservations whose hold lapsed before `now` as expired and
/// release their parcels. Returns the number of reservations expired.
pub async fn expire_overdue(conn: &mut PgConnection, now: i64) -> Result<u64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        WITH expired AS (
            UPDATE reservations SET status = 'expired'
            WHERE status = 'pending' AND expires_at < $1
            RETURNING id
        ), released AS (
            UPDATE reservation_items SET active = FALSE
            WHERE active AND reservation_id IN (SELECT id FROM expired)
            RETURNING id
        )
        SELECT COUNT(*) FROM expired
        "#,
    )
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count.max(0) as u64)
}

/// `pending → paid`. Returns `false` when the reservation is missing, no
/// longer pending, or its hold lapsed before `now`.
pub async fn mark_paid(pool: &PgPool, id: &str, now: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE reservations SET status = 'paid', paid_at = $2
        WHERE id = $1 AND status = 'pending' AND expires_at >= $2
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// `pending → cancelled`, releasing the parcels. Returns `false` when the
/// reservation is missing, no longer pending, or its hold lapsed before `now`.
pub async fn mark_cancelled(pool: &PgPool, id: &str, now: i64) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        WITH cancelled AS (
            UPDATE reservations SET status = 'cancelled'
            WHERE id = $1 AND status = 'pending' AND expires_at >= $2
            RETURNING id
        ), released AS (
            UPDATE reservation_items SET active = FALSE
            WHERE active AND reservation_id IN (SELECT id FROM cancelled)
            RETURNING id
        )
        SELECT COUNT(*) FROM cancelled
        "#,
    )
    .bind(id)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(count == 1)
}
