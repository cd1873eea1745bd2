use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::{account_queries, asset_queries, history_queries, investment_queries};
use crate::errors::AppError;
use crate::models::{
    BalanceTotals, CreateInvestment, Currency, Investment, InvestmentWithAsset, ListParams, MarketBalance,
    Paginated, PortfolioValuation, PriceTriple, UpdateInvestment, ValuationQuery, ValuationRange,
};
use crate::services::valuation_service;

/// A valuation query after validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationRequest {
    pub account_id: Uuid,
    pub currency: Currency,
    pub range: ValuationRange,
}

impl ValuationRequest {
    pub fn parse(query: &ValuationQuery) -> Result<Self, AppError> {
        let raw_account = query
            .account_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("account_id is required".to_string()))?;
        let account_id = Uuid::parse_str(raw_account)
            .map_err(|_| AppError::Validation(format!("Invalid account_id: {}", raw_account)))?;

        let currency = match query.currency.as_deref() {
            Some(raw) => raw.parse::<Currency>()?,
            None => Currency::default(),
        };
        let range = match query.range.as_deref() {
            Some(raw) => raw.parse::<ValuationRange>().map_err(AppError::Validation)?,
            None => ValuationRange::default(),
        };

        Ok(Self {
            account_id,
            currency,
            range,
        })
    }
}

pub async fn list(pool: &PgPool, user_id: Uuid, params: &ListParams) -> Result<Paginated<Investment>, AppError> {
    let page = params.page_ref();
    let rows = investment_queries::fetch_for_user(pool, user_id, params.account_id, page.limit as i64, params.offset())
        .await?;
    let total = investment_queries::count_for_user(pool, user_id, params.account_id).await?;
    Ok(Paginated::new(rows, total, page))
}

pub async fn get(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<InvestmentWithAsset, AppError> {
    let investment = investment_queries::fetch_owned(pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Investment not found: {}", id)))?;
    let asset = asset_queries::fetch_one(pool, investment.asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset not found: {}", investment.asset_id)))?;
    Ok(InvestmentWithAsset { investment, asset })
}

async fn require_account(pool: &PgPool, user_id: Uuid, account_id: Uuid) -> Result<(), AppError> {
    account_queries::fetch_owned(pool, user_id, account_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Account not found: {}", account_id)))
}

pub async fn create(pool: &PgPool, user_id: Uuid, input: CreateInvestment) -> Result<Investment, AppError> {
    require_account(pool, user_id, input.account_id).await?;
    asset_queries::fetch_one(pool, input.asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset not found: {}", input.asset_id)))?;

    if investment_queries::exists(pool, input.account_id, input.asset_id).await? {
        return Err(AppError::Conflict(
            "This asset is already tracked in the account".to_string(),
        ));
    }

    let investment = investment_queries::insert(pool, input.account_id, input.asset_id).await?;
    info!("Created investment {} in account {}", investment.id, investment.account_id);
    Ok(investment)
}

pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    input: UpdateInvestment,
) -> Result<Investment, AppError> {
    let current = investment_queries::fetch_owned(pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Investment not found: {}", id)))?;
    require_account(pool, user_id, input.account_id).await?;

    if current.account_id != input.account_id
        && investment_queries::exists(pool, input.account_id, current.asset_id).await?
    {
        return Err(AppError::Conflict(
            "Target account already tracks this asset".to_string(),
        ));
    }

    investment_queries::move_to_account(pool, id, input.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Investment not found: {}", id)))
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    investment_queries::fetch_owned(pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Investment not found: {}", id)))?;
    investment_queries::delete(pool, id).await?;
    Ok(())
}

/// Loads the account's holdings with their assets and each asset's first
/// close inside the range, then values them.
pub async fn valuate(pool: &PgPool, user_id: Uuid, request: ValuationRequest) -> Result<PortfolioValuation, AppError> {
    require_account(pool, user_id, request.account_id).await?;

    let investments = investment_queries::fetch_by_account(pool, request.account_id).await?;
    if investments.is_empty() {
        return Err(AppError::NotFound("No investments found".to_string()));
    }

    let asset_ids: Vec<Uuid> = investments.iter().map(|i| i.asset_id).collect();
    let mut assets: HashMap<Uuid, _> = asset_queries::fetch_by_ids(pool, &asset_ids)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let holdings: Vec<InvestmentWithAsset> = investments
        .into_iter()
        .filter_map(|investment| {
            assets
                .remove(&investment.asset_id)
                .map(|asset| InvestmentWithAsset { investment, asset })
        })
        .collect();

    let window_closes: HashMap<Uuid, PriceTriple> = match request.range.since(Utc::now()) {
        Some(since) => history_queries::earliest_closes_since(pool, &asset_ids, since.date_naive())
            .await?
            .into_iter()
            .map(|h| (h.asset_id, h.close_price))
            .collect(),
        None => HashMap::new(),
    };

    Ok(valuation_service::valuate(
        request.account_id,
        &holdings,
        &window_closes,
        request.currency,
        request.range,
    ))
}

pub async fn total_balance(pool: &PgPool, user_id: Uuid, request: ValuationRequest) -> Result<BalanceTotals, AppError> {
    Ok(valuate(pool, user_id, request).await?.totals)
}

pub async fn market_balance(
    pool: &PgPool,
    user_id: Uuid,
    request: ValuationRequest,
) -> Result<Vec<MarketBalance>, AppError> {
    let valuation = valuate(pool, user_id, request).await?;
    Ok(valuation_service::market_balances(&valuation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(account: Option<&str>, currency: Option<&str>, range: Option<&str>) -> ValuationQuery {
        ValuationQuery {
            account_id: account.map(String::from),
            currency: currency.map(String::from),
            range: range.map(String::from),
        }
    }

    #[test]
    fn defaults_to_usd_and_all_time() {
        let id = Uuid::new_v4();
        let request = ValuationRequest::parse(&query(Some(&id.to_string()), None, None)).unwrap();
        assert_eq!(request.account_id, id);
        assert_eq!(request.currency, Currency::Usd);
        assert_eq!(request.range, ValuationRange::All);
    }

    #[test]
    fn parses_currency_and_range() {
        let id = Uuid::new_v4().to_string();
        let request = ValuationRequest::parse(&query(Some(&id), Some("TRY"), Some("weekly"))).unwrap();
        assert_eq!(request.currency, Currency::Try);
        assert_eq!(request.range, ValuationRange::Weekly);
    }

    #[test]
    fn malformed_input_is_a_validation_error() {
        let id = Uuid::new_v4().to_string();
        for q in [
            query(None, None, None),
            query(Some("not-a-uuid"), None, None),
            query(Some(&id), Some("gbp"), None),
            query(Some(&id), None, Some("hourly")),
        ] {
            let err = ValuationRequest::parse(&q).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
        }
    }
}
