use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::{asset_queries, history_queries};
use crate::errors::AppError;
use crate::models::{CreateHistory, History, ListParams, Paginated, PriceTriple, UpdateHistory};

fn validate_close(close: &PriceTriple) -> Result<(), AppError> {
    let valid = [close.try_, close.usd, close.eur]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0);
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("Close prices must be zero or positive".to_string()))
    }
}

pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Paginated<History>, AppError> {
    let page = params.page_ref();
    let rows = history_queries::fetch_page(pool, params.asset_id, page.limit as i64, params.offset()).await?;
    let total = history_queries::count(pool, params.asset_id).await?;
    Ok(Paginated::new(rows, total, page))
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<History, AppError> {
    history_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("History not found with id of {}", id)))
}

/// A second row for the same asset and day is a conflict.
pub async fn create(pool: &PgPool, input: CreateHistory) -> Result<History, AppError> {
    validate_close(&input.close_price)?;
    asset_queries::fetch_one(pool, input.asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset not found with id of {}", input.asset_id)))?;

    let day = input.recorded_on.unwrap_or_else(|| Utc::now().date_naive());
    let history = history_queries::insert(pool, input.asset_id, day, &input.close_price).await?;
    Ok(history)
}

pub async fn update(pool: &PgPool, id: Uuid, input: UpdateHistory) -> Result<History, AppError> {
    validate_close(&input.close_price)?;
    history_queries::update(pool, id, &input.close_price)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("History not found with id of {}", id)))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    if history_queries::delete(pool, id).await? == 0 {
        return Err(AppError::NotFound(format!("History not found with id of {}", id)));
    }
    Ok(())
}

/// Copies every asset's current price into today's row. Returns the number
/// of rows written.
pub async fn snapshot_today(pool: &PgPool) -> Result<u64, AppError> {
    let today = Utc::now().date_naive();
    let written = history_queries::snapshot_all(pool, today).await?;
    info!("📸 Recorded {} history rows for {}", written, today);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_or_non_finite_closes() {
        assert!(validate_close(&PriceTriple::new(10.0, 0.3, 0.27)).is_ok());
        assert!(validate_close(&PriceTriple::new(-1.0, 0.3, 0.27)).is_err());
        assert!(validate_close(&PriceTriple::new(1.0, f64::INFINITY, 0.27)).is_err());
    }
}
