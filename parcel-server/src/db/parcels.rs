//! Parcel catalogue table

use shared::models::{Parcel, generate_all_parcels};
use sqlx::PgPool;

/// Upsert the full catalogue. Safe to run on every start.
pub async fn seed(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let parcels = generate_all_parcels();
    upsert(pool, &parcels).await
}

pub async fn upsert(pool: &PgPool, parcels: &[Parcel]) -> Result<u64, sqlx::Error> {
    let ids: Vec<&str> = parcels.iter().map(|p| p.id.as_str()).collect();
    let types: Vec<&str> = parcels.iter().map(|p| p.parcel_type.as_str()).collect();
    let prices: Vec<i64> = parcels.iter().map(|p| p.price_cents).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO parcels (id, parcel_type, price_cents)
        SELECT id, kind::parcel_type, price
        FROM UNNEST($1::text[], $2::text[], $3::bigint[]) AS t(id, kind, price)
        ON CONFLICT (id) DO UPDATE SET
            parcel_type = EXCLUDED.parcel_type,
            price_cents = EXCLUDED.price_cents
        WHERE parcels.parcel_type <> EXCLUDED.parcel_type
           OR parcels.price_cents <> EXCLUDED.price_cents
        "#,
    )
    .bind(&ids)
    .bind(&types)
    .bind(&prices)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
