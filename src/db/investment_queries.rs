use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Investment;
use crate::services::cost_basis::Holding;

const INVESTMENT_COLUMNS: &str =
    "i.id, i.account_id, i.asset_id, i.amount, i.avg_try, i.avg_usd, i.avg_eur, i.created_at, i.updated_at";

/// Investments of every account the user owns, optionally narrowed to one
/// account.
pub async fn fetch_for_user(
    pool: &PgPool,
    user_id: Uuid,
    account_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Investment>, sqlx::Error> {
    sqlx::query_as::<_, Investment>(&format!(
        "SELECT {}
         FROM investments i
         JOIN accounts a ON a.id = i.account_id
         WHERE a.user_id = $1 AND ($2::uuid IS NULL OR i.account_id = $2)
         ORDER BY i.created_at DESC
         LIMIT $3 OFFSET $4",
        INVESTMENT_COLUMNS
    ))
    .bind(user_id)
    .bind(account_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_for_user(
    pool: &PgPool,
    user_id: Uuid,
    account_id: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*)
         FROM investments i
         JOIN accounts a ON a.id = i.account_id
         WHERE a.user_id = $1 AND ($2::uuid IS NULL OR i.account_id = $2)",
    )
    .bind(user_id)
    .bind(account_id)
    .fetch_one(pool)
    .await
}

pub async fn fetch_owned(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Investment>, sqlx::Error> {
    sqlx::query_as::<_, Investment>(&format!(
        "SELECT {}
         FROM investments i
         JOIN accounts a ON a.id = i.account_id
         WHERE i.id = $1 AND a.user_id = $2",
        INVESTMENT_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_by_account(pool: &PgPool, account_id: Uuid) -> Result<Vec<Investment>, sqlx::Error> {
    sqlx::query_as::<_, Investment>(&format!(
        "SELECT {} FROM investments i WHERE i.account_id = $1 ORDER BY i.created_at",
        INVESTMENT_COLUMNS
    ))
    .bind(account_id)
    .fetch_all(pool)
    .await
}

pub async fn exists(pool: &PgPool, account_id: Uuid, asset_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM investments WHERE account_id = $1 AND asset_id = $2)",
    )
    .bind(account_id)
    .bind(asset_id)
    .fetch_one(pool)
    .await
}

pub async fn insert(pool: &PgPool, account_id: Uuid, asset_id: Uuid) -> Result<Investment, sqlx::Error> {
    sqlx::query_as::<_, Investment>(&format!(
        "INSERT INTO investments AS i (account_id, asset_id)
         VALUES ($1, $2)
         RETURNING {}",
        INVESTMENT_COLUMNS
    ))
    .bind(account_id)
    .bind(asset_id)
    .fetch_one(pool)
    .await
}

pub async fn move_to_account(
    pool: &PgPool,
    id: Uuid,
    account_id: Uuid,
) -> Result<Option<Investment>, sqlx::Error> {
    sqlx::query_as::<_, Investment>(&format!(
        "UPDATE investments AS i
         SET account_id = $2, updated_at = NOW()
         WHERE i.id = $1
         RETURNING {}",
        INVESTMENT_COLUMNS
    ))
    .bind(id)
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM investments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Locks the investment row for the rest of the surrounding transaction,
/// provided it belongs to `user_id`.
pub async fn lock_owned(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Investment>, sqlx::Error> {
    sqlx::query_as::<_, Investment>(&format!(
        "SELECT {}
         FROM investments i
         JOIN accounts a ON a.id = i.account_id
         WHERE i.id = $1 AND a.user_id = $2
         FOR UPDATE OF i",
        INVESTMENT_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn store_holding(
    conn: &mut PgConnection,
    id: Uuid,
    holding: &Holding,
) -> Result<Investment, sqlx::Error> {
    sqlx::query_as::<_, Investment>(&format!(
        "UPDATE investments AS i
         SET amount = $2, avg_try = $3, avg_usd = $4, avg_eur = $5, updated_at = NOW()
         WHERE i.id = $1
         RETURNING {}",
        INVESTMENT_COLUMNS
    ))
    .bind(id)
    .bind(holding.amount)
    .bind(holding.avg_price.try_)
    .bind(holding.avg_price.usd)
    .bind(holding.avg_price.eur)
    .fetch_one(conn)
    .await
}
