use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::account_queries;
use crate::errors::AppError;
use crate::models::{Account, CreateAccount, ListParams, Paginated, UpdateAccount};

pub async fn list(pool: &PgPool, user_id: Uuid, params: &ListParams) -> Result<Paginated<Account>, AppError> {
    let page = params.page_ref();
    let rows = account_queries::fetch_for_user(pool, user_id, page.limit as i64, params.offset()).await?;
    let total = account_queries::count_for_user(pool, user_id).await?;
    Ok(Paginated::new(rows, total, page))
}

pub async fn get(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Account, AppError> {
    account_queries::fetch_owned(pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account not found with id of {}", id)))
}

pub async fn create(pool: &PgPool, user_id: Uuid, input: CreateAccount) -> Result<Account, AppError> {
    let name = input.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let account = account_queries::insert(pool, &Account::new(user_id, name)).await?;
    info!("Created account {} for user {}", account.id, user_id);
    Ok(account)
}

pub async fn update(pool: &PgPool, user_id: Uuid, id: Uuid, input: UpdateAccount) -> Result<Account, AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Account name cannot be empty".to_string()));
    }
    account_queries::rename(pool, user_id, id, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account not found with id of {}", id)))
}

/// Deleting an account cascades to its investments and their transactions.
pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    if account_queries::delete_owned(pool, user_id, id).await? == 0 {
        return Err(AppError::NotFound(format!("Account not found with id of {}", id)));
    }
    Ok(())
}
