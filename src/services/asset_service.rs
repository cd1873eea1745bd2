use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::asset_queries::{self, AssetFilter, SORTABLE_COLUMNS};
use crate::db::order_clause;
use crate::errors::AppError;
use crate::models::{Asset, AssetMarket, AssetUpsert, CreateAsset, ListParams, Paginated, UpdateAsset};
use crate::services::rate_service::RateService;

/// Tickers shown on the landing page ticker tape.
pub const TREND_TICKERS: [&str; 7] = ["USD", "EUR", "SPX", "IXIC", "XU100", "BTC", "ETH"];

fn filter_from(params: &ListParams) -> Result<AssetFilter, AppError> {
    let market = params
        .market
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| m.parse::<AssetMarket>().map_err(AppError::Validation))
        .transpose()?;

    Ok(AssetFilter {
        market,
        search: params.search_term().map(str::to_string),
    })
}

pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Paginated<Asset>, AppError> {
    let filter = filter_from(params)?;
    let order_by = order_clause(params.sort.as_deref(), SORTABLE_COLUMNS).map_err(AppError::Validation)?;
    let page = params.page_ref();

    let rows = asset_queries::fetch_page(pool, &filter, &order_by, page.limit as i64, params.offset()).await?;
    let total = asset_queries::count(pool, &filter).await?;
    Ok(Paginated::new(rows, total, page))
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Asset, AppError> {
    asset_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset not found with id of {}", id)))
}

pub async fn create(pool: &PgPool, rates: &RateService, input: CreateAsset) -> Result<Asset, AppError> {
    let ticker = input.ticker.trim().to_uppercase();
    let name = input.name.trim().to_string();
    if ticker.is_empty() || name.is_empty() {
        return Err(AppError::Validation("Ticker and name are required".to_string()));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(AppError::Validation("Price must be zero or positive".to_string()));
    }
    if asset_queries::fetch_by_ticker(pool, &ticker, input.market).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Asset {} already exists in {}",
            ticker, input.market
        )));
    }

    let entered_in = input.currency.unwrap_or_else(|| input.market.native_currency());
    let price = rates.convert_triple(input.price, entered_in).await?;
    let asset = asset_queries::insert(
        pool,
        &AssetUpsert {
            ticker,
            name,
            market: input.market,
            currency: entered_in,
            price,
            icon: input.icon.unwrap_or_default(),
        },
    )
    .await?;

    info!("Created asset {} ({})", asset.ticker, asset.market);
    Ok(asset)
}

pub async fn update(pool: &PgPool, rates: &RateService, id: Uuid, input: UpdateAsset) -> Result<Asset, AppError> {
    let current = get(pool, id).await?;

    let price = match input.price {
        Some(price) if !price.is_finite() || price < 0.0 => {
            return Err(AppError::Validation("Price must be zero or positive".to_string()));
        }
        Some(price) => {
            let entered_in = input.currency.unwrap_or(current.currency);
            rates.convert_triple(price, entered_in).await?
        }
        None => current.price,
    };
    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or(current.name);
    let icon = input.icon.unwrap_or(current.icon);

    asset_queries::update(pool, id, &name, &icon, current.currency, price)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset not found with id of {}", id)))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    if asset_queries::delete(pool, id).await? == 0 {
        return Err(AppError::NotFound(format!("Asset not found with id of {}", id)));
    }
    Ok(())
}

pub async fn trends(pool: &PgPool) -> Result<Vec<Asset>, AppError> {
    let assets = asset_queries::fetch_by_tickers(pool, &TREND_TICKERS).await?;
    if assets.is_empty() {
        return Err(AppError::NotFound("No trend assets found.".to_string()));
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_filter_accepts_wire_names_only() {
        let params = ListParams {
            market: Some("crypto".into()),
            search: Some("  btc ".into()),
            ..Default::default()
        };
        let filter = filter_from(&params).unwrap();
        assert_eq!(filter.market, Some(AssetMarket::Crypto));
        assert_eq!(filter.search.as_deref(), Some("btc"));

        let bad = ListParams {
            market: Some("bonds".into()),
            ..Default::default()
        };
        assert!(matches!(filter_from(&bad), Err(AppError::Validation(_))));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let params = ListParams {
            market: Some(" ".into()),
            search: Some("".into()),
            ..Default::default()
        };
        let filter = filter_from(&params).unwrap();
        assert!(filter.market.is_none());
        assert!(filter.search.is_none());
    }
}
