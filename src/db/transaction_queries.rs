use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Currency, PriceTriple, Transaction, TransactionType};

const TRANSACTION_COLUMNS: &str = "t.id, t.investment_id, t.transaction_type, t.quantity, t.price, \
     t.currency, t.price_try, t.price_usd, t.price_eur, t.executed_at, t.created_at, t.updated_at";

/// Values written for a transaction row, after conversion.
#[derive(Debug, Clone)]
pub struct TransactionWrite {
    pub transaction_type: TransactionType,
    pub quantity: f64,
    pub price: f64,
    pub currency: Currency,
    pub price_converted: PriceTriple,
    pub executed_at: DateTime<Utc>,
}

pub async fn fetch_for_user(
    pool: &PgPool,
    user_id: Uuid,
    investment_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {}
         FROM transactions t
         JOIN investments i ON i.id = t.investment_id
         JOIN accounts a ON a.id = i.account_id
         WHERE a.user_id = $1 AND ($2::uuid IS NULL OR t.investment_id = $2)
         ORDER BY t.executed_at DESC, t.created_at DESC
         LIMIT $3 OFFSET $4",
        TRANSACTION_COLUMNS
    ))
    .bind(user_id)
    .bind(investment_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_for_user(
    pool: &PgPool,
    user_id: Uuid,
    investment_id: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*)
         FROM transactions t
         JOIN investments i ON i.id = t.investment_id
         JOIN accounts a ON a.id = i.account_id
         WHERE a.user_id = $1 AND ($2::uuid IS NULL OR t.investment_id = $2)",
    )
    .bind(user_id)
    .bind(investment_id)
    .fetch_one(pool)
    .await
}

pub async fn fetch_owned(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {}
         FROM transactions t
         JOIN investments i ON i.id = t.investment_id
         JOIN accounts a ON a.id = i.account_id
         WHERE t.id = $1 AND a.user_id = $2",
        TRANSACTION_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Full history of one investment in execution order.
pub async fn fetch_for_investment(
    conn: &mut PgConnection,
    investment_id: Uuid,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {}
         FROM transactions t
         WHERE t.investment_id = $1
         ORDER BY t.executed_at, t.created_at",
        TRANSACTION_COLUMNS
    ))
    .bind(investment_id)
    .fetch_all(conn)
    .await
}

/// Reads one transaction on the connection holding the investment lock.
pub async fn fetch_locked(
    conn: &mut PgConnection,
    investment_id: Uuid,
    id: Uuid,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {}
         FROM transactions t
         WHERE t.id = $1 AND t.investment_id = $2",
        TRANSACTION_COLUMNS
    ))
    .bind(id)
    .bind(investment_id)
    .fetch_optional(conn)
    .await
}

pub async fn insert(
    conn: &mut PgConnection,
    investment_id: Uuid,
    write: &TransactionWrite,
) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "INSERT INTO transactions AS t
             (investment_id, transaction_type, quantity, price, currency,
              price_try, price_usd, price_eur, executed_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        TRANSACTION_COLUMNS
    ))
    .bind(investment_id)
    .bind(write.transaction_type.as_str())
    .bind(write.quantity)
    .bind(write.price)
    .bind(write.currency.as_str())
    .bind(write.price_converted.try_)
    .bind(write.price_converted.usd)
    .bind(write.price_converted.eur)
    .bind(write.executed_at)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    write: &TransactionWrite,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "UPDATE transactions AS t
         SET transaction_type = $2, quantity = $3, price = $4, currency = $5,
             price_try = $6, price_usd = $7, price_eur = $8, executed_at = $9,
             updated_at = NOW()
         WHERE t.id = $1
         RETURNING {}",
        TRANSACTION_COLUMNS
    ))
    .bind(id)
    .bind(write.transaction_type.as_str())
    .bind(write.quantity)
    .bind(write.price)
    .bind(write.currency.as_str())
    .bind(write.price_converted.try_)
    .bind(write.price_converted.usd)
    .bind(write.price_converted.eur)
    .bind(write.executed_at)
    .fetch_optional(conn)
    .await
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
