use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{History, PriceTriple};

const HISTORY_COLUMNS: &str =
    "id, asset_id, recorded_on, close_try, close_usd, close_eur, created_at";

pub async fn fetch_page(
    pool: &PgPool,
    asset_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<History>, sqlx::Error> {
    sqlx::query_as::<_, History>(&format!(
        "SELECT {}
         FROM histories
         WHERE ($1::uuid IS NULL OR asset_id = $1)
         ORDER BY recorded_on DESC, created_at DESC
         LIMIT $2 OFFSET $3",
        HISTORY_COLUMNS
    ))
    .bind(asset_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, asset_id: Option<Uuid>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM histories WHERE ($1::uuid IS NULL OR asset_id = $1)",
    )
    .bind(asset_id)
    .fetch_one(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<History>, sqlx::Error> {
    sqlx::query_as::<_, History>(&format!("SELECT {} FROM histories WHERE id = $1", HISTORY_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    asset_id: Uuid,
    recorded_on: NaiveDate,
    close: &PriceTriple,
) -> Result<History, sqlx::Error> {
    sqlx::query_as::<_, History>(&format!(
        "INSERT INTO histories (asset_id, recorded_on, close_try, close_usd, close_eur)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        HISTORY_COLUMNS
    ))
    .bind(asset_id)
    .bind(recorded_on)
    .bind(close.try_)
    .bind(close.usd)
    .bind(close.eur)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, id: Uuid, close: &PriceTriple) -> Result<Option<History>, sqlx::Error> {
    sqlx::query_as::<_, History>(&format!(
        "UPDATE histories SET close_try = $2, close_usd = $3, close_eur = $4
         WHERE id = $1
         RETURNING {}",
        HISTORY_COLUMNS
    ))
    .bind(id)
    .bind(close.try_)
    .bind(close.usd)
    .bind(close.eur)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM histories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Earliest close on or after `since` for each of the given assets.
pub async fn earliest_closes_since(
    pool: &PgPool,
    asset_ids: &[Uuid],
    since: NaiveDate,
) -> Result<Vec<History>, sqlx::Error> {
    sqlx::query_as::<_, History>(&format!(
        "SELECT DISTINCT ON (asset_id) {}
         FROM histories
         WHERE asset_id = ANY($1) AND recorded_on >= $2
         ORDER BY asset_id, recorded_on ASC",
        HISTORY_COLUMNS
    ))
    .bind(asset_ids)
    .bind(since)
    .fetch_all(pool)
    .await
}

/// Copies every asset's current price into today's history row. Assets that
/// already have a row for the day are left alone.
pub async fn snapshot_all(pool: &PgPool, day: NaiveDate) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO histories (asset_id, recorded_on, close_try, close_usd, close_eur)
         SELECT id, $1, price_try, price_usd, price_eur FROM assets
         ON CONFLICT (asset_id, recorded_on) DO NOTHING",
    )
    .bind(day)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
