use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::db::transaction_queries::{self, TransactionWrite};
use crate::db::{asset_queries, investment_queries};
use crate::errors::AppError;
use crate::models::{
    CreateTransaction, Currency, Investment, ListParams, Paginated, Transaction, UpdateTransaction,
};
use crate::services::cost_basis::{self, TransactionLeg};
use crate::services::rate_service::RateService;

fn validate_amounts(quantity: f64, price: f64) -> Result<(), AppError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(AppError::Validation("Quantity must be greater than zero".to_string()));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation("Price must be zero or positive".to_string()));
    }
    Ok(())
}

/// Recomputes amount and average cost from the full history. Must run on the
/// connection that holds the investment lock.
async fn recompute_holding(conn: &mut PgConnection, investment_id: Uuid) -> Result<Investment, AppError> {
    let history = transaction_queries::fetch_for_investment(&mut *conn, investment_id).await?;
    let legs: Vec<TransactionLeg> = history.iter().map(TransactionLeg::from).collect();
    let holding = cost_basis::compute(&legs)?;
    let investment = investment_queries::store_holding(&mut *conn, investment_id, &holding).await?;
    Ok(investment)
}

async fn native_currency(pool: &PgPool, investment: &Investment) -> Result<Currency, AppError> {
    let asset = asset_queries::fetch_one(pool, investment.asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset not found: {}", investment.asset_id)))?;
    Ok(asset.currency)
}

pub async fn list(pool: &PgPool, user_id: Uuid, params: &ListParams) -> Result<Paginated<Transaction>, AppError> {
    let page = params.page_ref();
    let rows = transaction_queries::fetch_for_user(
        pool,
        user_id,
        params.investment_id,
        page.limit as i64,
        params.offset(),
    )
    .await?;
    let total = transaction_queries::count_for_user(pool, user_id, params.investment_id).await?;
    Ok(Paginated::new(rows, total, page))
}

pub async fn get(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Transaction, AppError> {
    transaction_queries::fetch_owned(pool, user_id, id)
        .await?
        .ok_or_else(|| transaction_not_found(id))
}

pub async fn create(
    pool: &PgPool,
    rates: &RateService,
    user_id: Uuid,
    input: CreateTransaction,
) -> Result<Transaction, AppError> {
    validate_amounts(input.quantity, input.price)?;
    let rates = rates.current().await?;

    let mut tx = pool.begin().await?;
    let investment = investment_queries::lock_owned(&mut *tx, user_id, input.investment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Investment not found: {}", input.investment_id)))?;

    let currency = match input.currency {
        Some(currency) => currency,
        None => native_currency(pool, &investment).await?,
    };
    let write = TransactionWrite {
        transaction_type: input.transaction_type,
        quantity: input.quantity,
        price: input.price,
        currency,
        price_converted: rates.to_triple(input.price, currency),
        executed_at: input.executed_at.unwrap_or_else(Utc::now),
    };

    let created = transaction_queries::insert(&mut *tx, investment.id, &write).await?;
    let holding = recompute_holding(&mut *tx, investment.id).await?;
    tx.commit().await?;

    info!(
        "Recorded {} of {} for investment {} (amount now {})",
        write.transaction_type.as_str(),
        write.quantity,
        investment.id,
        holding.amount
    );
    Ok(created)
}

/// Applies a partial update onto the current row. The second value is true
/// when the entered price or currency changed and the price must be
/// converted again; otherwise the rates in force at the original write are
/// kept.
fn merged_write(existing: &Transaction, input: &UpdateTransaction) -> Result<(TransactionWrite, bool), AppError> {
    let quantity = input.quantity.unwrap_or(existing.quantity);
    let price = input.price.unwrap_or(existing.price);
    let currency = input.currency.unwrap_or(existing.currency);
    validate_amounts(quantity, price)?;

    let reconvert = price != existing.price || currency != existing.currency;
    let write = TransactionWrite {
        transaction_type: input.transaction_type.unwrap_or(existing.transaction_type),
        quantity,
        price,
        currency,
        price_converted: existing.price_converted,
        executed_at: input.executed_at.unwrap_or(existing.executed_at),
    };
    Ok((write, reconvert))
}

fn transaction_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Transaction not found: {}", id))
}

pub async fn update(
    pool: &PgPool,
    rates: &RateService,
    user_id: Uuid,
    id: Uuid,
    input: UpdateTransaction,
) -> Result<Transaction, AppError> {
    let investment_id = get(pool, user_id, id).await?.investment_id;

    let mut tx = pool.begin().await?;
    investment_queries::lock_owned(&mut *tx, user_id, investment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Investment not found: {}", investment_id)))?;

    // Latest row, read under the investment lock.
    let existing = transaction_queries::fetch_locked(&mut *tx, investment_id, id)
        .await?
        .ok_or_else(|| transaction_not_found(id))?;
    let (mut write, reconvert) = merged_write(&existing, &input)?;
    if reconvert {
        write.price_converted = rates.current().await?.to_triple(write.price, write.currency);
    }

    let updated = transaction_queries::update(&mut *tx, id, &write)
        .await?
        .ok_or_else(|| transaction_not_found(id))?;
    recompute_holding(&mut *tx, investment_id).await?;
    tx.commit().await?;

    Ok(updated)
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let investment_id = get(pool, user_id, id).await?.investment_id;

    let mut tx = pool.begin().await?;
    investment_queries::lock_owned(&mut *tx, user_id, investment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Investment not found: {}", investment_id)))?;
    if transaction_queries::delete(&mut *tx, id).await? == 0 {
        return Err(transaction_not_found(id));
    }
    recompute_holding(&mut *tx, investment_id).await?;
    tx.commit().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceTriple, TransactionType};

    #[test]
    fn rejects_non_positive_quantities_and_negative_prices() {
        assert!(validate_amounts(1.0, 0.0).is_ok());
        assert!(matches!(validate_amounts(0.0, 10.0), Err(AppError::Validation(_))));
        assert!(matches!(validate_amounts(-2.0, 10.0), Err(AppError::Validation(_))));
        assert!(matches!(validate_amounts(1.0, -0.5), Err(AppError::Validation(_))));
        assert!(matches!(validate_amounts(f64::NAN, 1.0), Err(AppError::Validation(_))));
    }

    fn recorded() -> Transaction {
        let executed_at = Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            investment_id: Uuid::new_v4(),
            transaction_type: TransactionType::Buy,
            quantity: 2.0,
            price: 100.0,
            currency: Currency::Usd,
            price_converted: PriceTriple::new(3400.0, 100.0, 92.0),
            executed_at,
            created_at: executed_at,
            updated_at: executed_at,
        }
    }

    #[test]
    fn partial_update_keeps_original_conversion() {
        let existing = recorded();
        let input = UpdateTransaction {
            quantity: Some(5.0),
            ..Default::default()
        };
        let (write, reconvert) = merged_write(&existing, &input).unwrap();
        assert!(!reconvert);
        assert_eq!(write.quantity, 5.0);
        assert_eq!(write.price, 100.0);
        assert_eq!(write.price_converted, existing.price_converted);
        assert_eq!(write.transaction_type, TransactionType::Buy);
    }

    #[test]
    fn price_or_currency_change_requires_conversion() {
        let existing = recorded();
        let repriced = UpdateTransaction {
            price: Some(120.0),
            ..Default::default()
        };
        assert!(merged_write(&existing, &repriced).unwrap().1);

        let switched_currency = UpdateTransaction {
            currency: Some(Currency::Eur),
            ..Default::default()
        };
        assert!(merged_write(&existing, &switched_currency).unwrap().1);

        let invalid = UpdateTransaction {
            quantity: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(merged_write(&existing, &invalid), Err(AppError::Validation(_))));
    }
}
