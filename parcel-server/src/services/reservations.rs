//! Reservation lifecycle: `pending → paid | expired | cancelled`
//!
//! Reads that report availability sweep lapsed holds first, so a parcel
//! whose hold ran out is never shown as reserved.

use std::collections::BTreeMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    CreateReservation, ParcelAvailability, ParcelStatus, ParcelSummary, Reservation,
    ReservationFilters, ReservationStatus, ResolvedFilters, cents_to_euros, count_by_type,
    generate_all_parcels, parcel_by_id, sort_for_admin,
};
use shared::util::generate_reservation_id;
use sqlx::PgPool;

use crate::db;
use crate::db::reservations::NewReservation;
use crate::error::ServiceResult;

/// Attempts at finding an unused reservation number
const MAX_ID_ATTEMPTS: u32 = 3;

/// Validate the request and store a pending reservation holding its parcels.
///
/// The expiry sweep and the insert share one transaction. Fails with
/// `ParcelNotAvailable` when any parcel is already held, including when a
/// concurrent request wins the race for it.
pub async fn create_reservation(
    pool: &PgPool,
    request: CreateReservation,
    now: i64,
    hold_ms: i64,
) -> ServiceResult<Reservation> {
    let request = request.normalized();
    let parcels = request.check()?;
    let parcel_ids: Vec<String> = parcels.iter().map(|p| p.id.clone()).collect();
    let total_cents: i64 = parcels.iter().map(|p| p.price_cents).sum();

    for attempt in 1..=MAX_ID_ATTEMPTS {
        let new = NewReservation {
            id: generate_reservation_id(now),
            parcels: parcel_ids.clone(),
            buyer_name: request.buyer_name.clone(),
            buyer_email: request.buyer_email.clone(),
            buyer_address: request.buyer_address.clone(),
            buyer_city: request.buyer_city.clone(),
            buyer_zip: request.buyer_zip.clone(),
            donor_name: request.donor_name.clone(),
            anonymous: request.anonymous,
            receipt_requested: request.receipt_requested,
            total_cents,
            created_at: now,
            expires_at: now + hold_ms,
        };

        let mut tx = pool.begin().await?;
        let expired = db::reservations::expire_overdue(&mut *tx, now).await?;
        if expired > 0 {
            tracing::info!(expired, "Expired lapsed reservations");
        }

        let held = db::reservations::held_parcels(&mut *tx, &parcel_ids).await?;
        if !held.is_empty() {
            tx.commit().await?;
            return Err(AppError::parcels_unavailable(&held).into());
        }

        match db::reservations::insert(&mut *tx, &new).await {
            Ok(()) => {
                tx.commit().await?;
                tracing::info!(
                    reservation_id = %new.id,
                    parcels = new.parcels.len(),
                    total_cents,
                    "Reservation created"
                );
                return Ok(pending_reservation(new));
            }
            Err(e) => {
                drop(tx);
                match db::unique_violation(&e).as_deref() {
                    Some(db::RESERVATION_PKEY) => {
                        tracing::warn!(attempt, reservation_id = %new.id, "Reservation number collision, retrying");
                    }
                    Some(db::ACTIVE_PARCEL_INDEX) => {
                        let mut conn = pool.acquire().await?;
                        let held = db::reservations::held_parcels(&mut *conn, &parcel_ids).await?;
                        tracing::info!(parcels = ?held, "Parcels taken by a concurrent reservation");
                        return Err(AppError::parcels_unavailable(&held).into());
                    }
                    _ => return Err(e.into()),
                }
            }
        }
    }

    Err(AppError::internal("Could not allocate a reservation number").into())
}

fn pending_reservation(new: NewReservation) -> Reservation {
    Reservation {
        id: new.id,
        parcels: new.parcels,
        buyer_name: new.buyer_name,
        buyer_email: new.buyer_email,
        buyer_address: new.buyer_address,
        buyer_city: new.buyer_city,
        buyer_zip: new.buyer_zip,
        donor_name: new.donor_name,
        anonymous: new.anonymous,
        receipt_requested: new.receipt_requested,
        total_cents: new.total_cents,
        total_amount: cents_to_euros(new.total_cents),
        status: ReservationStatus::Pending,
        created_at: new.created_at,
        expires_at: new.expires_at,
        paid_at: None,
    }
}

/// `true` when none of `parcel_ids` is held at `now`
pub async fn are_parcels_available(
    pool: &PgPool,
    parcel_ids: &[String],
    now: i64,
) -> ServiceResult<bool> {
    if parcel_ids.is_empty() {
        return Ok(true);
    }
    expire_reservations(pool, now).await?;
    let mut conn = pool.acquire().await?;
    let held = db::reservations::held_parcels(&mut *conn, parcel_ids).await?;
    Ok(held.is_empty())
}

pub async fn get_reservation(pool: &PgPool, id: &str) -> ServiceResult<Reservation> {
    db::reservations::find(pool, id)
        .await?
        .ok_or_else(|| AppError::reservation_not_found(id).into())
}

/// All reservations, newest first
pub async fn get_all_reservations(pool: &PgPool) -> ServiceResult<Vec<Reservation>> {
    Ok(db::reservations::list(pool, &ResolvedFilters::default()).await?)
}

/// Reservations matching `filters`, newest first
pub async fn get_reservations_filtered(
    pool: &PgPool,
    filters: &ReservationFilters,
) -> ServiceResult<Vec<Reservation>> {
    let resolved = filters.resolve()?;
    Ok(db::reservations::list(pool, &resolved).await?)
}

/// Admin view: sweep, filter, then order by status and recency
pub async fn list_for_admin(
    pool: &PgPool,
    filters: &ReservationFilters,
    now: i64,
) -> ServiceResult<Vec<Reservation>> {
    let resolved = filters.resolve()?;
    expire_reservations(pool, now).await?;
    let mut reservations = db::reservations::list(pool, &resolved).await?;
    sort_for_admin(&mut reservations);
    Ok(reservations)
}

/// Explain why a transition did not apply
async fn transition_error(pool: &PgPool, id: &str, now: i64) -> ServiceResult<AppError> {
    let current = get_reservation(pool, id).await?;
    if current.status == ReservationStatus::Pending && current.expires_at < now {
        expire_reservations(pool, now).await?;
        return Ok(AppError::with_message(
            ErrorCode::ReservationExpired,
            "Reservation hold has expired",
        )
        .with_detail("status", ReservationStatus::Expired.as_str()));
    }
    Ok(AppError::reservation_not_pending(current.status.as_str()))
}

/// `pending → paid`. A hold that lapsed before `now` cannot be confirmed.
pub async fn confirm_reservation(
    pool: &PgPool,
    id: &str,
    now: i64,
) -> ServiceResult<Reservation> {
    if !db::reservations::mark_paid(pool, id, now).await? {
        return Err(transition_error(pool, id, now).await?.into());
    }
    tracing::info!(reservation_id = %id, "Reservation confirmed as paid");
    get_reservation(pool, id).await
}

/// `pending → cancelled`, releasing the parcels. A lapsed hold reports
/// `expired` instead.
pub async fn cancel_reservation(pool: &PgPool, id: &str, now: i64) -> ServiceResult<Reservation> {
    if !db::reservations::mark_cancelled(pool, id, now).await? {
        return Err(transition_error(pool, id, now).await?.into());
    }
    tracing::info!(reservation_id = %id, "Reservation cancelled");
    get_reservation(pool, id).await
}

/// Expire every pending reservation whose hold lapsed before `now`
pub async fn expire_reservations(pool: &PgPool, now: i64) -> ServiceResult<u64> {
    let mut tx = pool.begin().await?;
    let expired = db::reservations::expire_overdue(&mut *tx, now).await?;
    tx.commit().await?;
    if expired > 0 {
        tracing::info!(expired, "Expired lapsed reservations");
    }
    Ok(expired)
}

fn split_holdings(holdings: Vec<(String, ReservationStatus)>) -> ParcelAvailability {
    let mut availability = ParcelAvailability::default();
    for (parcel_id, status) in holdings {
        match status {
            ReservationStatus::Paid => availability.sold.push(parcel_id),
            ReservationStatus::Pending => availability.reserved.push(parcel_id),
            ReservationStatus::Expired | ReservationStatus::Cancelled => {}
        }
    }
    availability
}

/// Sold and reserved parcel IDs, after sweeping lapsed holds
pub async fn get_sold_and_reserved_parcels(
    pool: &PgPool,
    now: i64,
) -> ServiceResult<ParcelAvailability> {
    expire_reservations(pool, now).await?;
    let holdings = db::reservations::active_holdings(pool, now).await?;
    Ok(split_holdings(holdings))
}

/// Status of every parcel that is not available. Sold wins over reserved.
pub fn parcel_statuses(availability: &ParcelAvailability) -> BTreeMap<String, ParcelStatus> {
    let mut statuses = BTreeMap::new();
    for id in &availability.reserved {
        statuses.insert(id.clone(), ParcelStatus::Reserved);
    }
    for id in &availability.sold {
        statuses.insert(id.clone(), ParcelStatus::Sold);
    }
    statuses
}

pub async fn get_parcel_statuses(
    pool: &PgPool,
    now: i64,
) -> ServiceResult<BTreeMap<String, ParcelStatus>> {
    let availability = get_sold_and_reserved_parcels(pool, now).await?;
    Ok(parcel_statuses(&availability))
}

/// Remaining parcels per type for the given holdings
pub fn summarize(availability: &ParcelAvailability) -> ParcelSummary {
    let lookup = |ids: &[String]| {
        let parcels: Vec<_> = ids.iter().filter_map(|id| parcel_by_id(id)).collect();
        count_by_type(&parcels)
    };
    let total = count_by_type(&generate_all_parcels());
    ParcelSummary {
        available: total.remaining(
            &lookup(availability.sold.as_slice()),
            &lookup(availability.reserved.as_slice()),
        ),
    }
}

/// Available parcels per type. Pending holds count only until they lapse.
pub async fn parcel_summary(pool: &PgPool, now: i64) -> ServiceResult<ParcelSummary> {
    let holdings = db::reservations::active_holdings(pool, now).await?;
    Ok(summarize(&split_holdings(holdings)))
}
