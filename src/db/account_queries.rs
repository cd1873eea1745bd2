use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::Account;

pub async fn fetch_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, user_id, name, created_at, updated_at
         FROM accounts
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn fetch_owned(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, user_id, name, created_at, updated_at
         FROM accounts
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert<'e, E>(executor: E, account: &Account) -> Result<Account, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (id, user_id, name, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, user_id, name, created_at, updated_at",
    )
    .bind(account.id)
    .bind(account.user_id)
    .bind(&account.name)
    .bind(account.created_at)
    .bind(account.updated_at)
    .fetch_one(executor)
    .await
}

pub async fn rename(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    name: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "UPDATE accounts
         SET name = $3, updated_at = NOW()
         WHERE id = $1 AND user_id = $2
         RETURNING id, user_id, name, created_at, updated_at",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn delete_owned(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
