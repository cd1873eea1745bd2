use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{Role, User};

const USER_COLUMNS: &str = "id, fullname, email, phone, role, password_hash, created_at";

pub async fn insert<'e, E>(
    executor: E,
    fullname: &str,
    email: &str,
    phone: &str,
    role: Role,
    password_hash: &str,
) -> Result<User, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (fullname, email, phone, role, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(fullname)
    .bind(email)
    .bind(phone)
    .bind(role.as_str())
    .bind(password_hash)
    .fetch_one(executor)
    .await
}

pub async fn fetch_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn email_or_phone_taken(pool: &PgPool, email: &str, phone: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR phone = $2)",
    )
    .bind(email)
    .bind(phone)
    .fetch_one(pool)
    .await
}
