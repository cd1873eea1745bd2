//! Live views that scrape on every request and never touch the database.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::external::scraper::MarketScraper;
use crate::middleware::validated::{ValidPath, ValidQuery};
use crate::models::{ApiResponse, AssetMarket, ScrapedQuote, SearchParams};
use crate::state::AppState;

pub fn stocks_router() -> Router<AppState> {
    Router::new()
        .route("/", get(stocks_by_listing))
        .route("/tr", get(tr_stocks))
        .route("/usa", get(usa_stocks))
}

pub fn crypto_router() -> Router<AppState> {
    Router::new().route("/", get(crypto))
}

pub fn commodities_router() -> Router<AppState> {
    Router::new().route("/", get(commodities))
}

pub fn indices_router() -> Router<AppState> {
    Router::new().route("/", get(indices))
}

pub fn funds_router() -> Router<AppState> {
    Router::new()
        .route("/", get(funds))
        .route("/:ticker", get(fund_by_ticker))
}

async fn scrape_filtered(
    scraper: Arc<dyn MarketScraper>,
    params: &SearchParams,
) -> Result<Vec<ScrapedQuote>, AppError> {
    let quotes = scraper.fetch().await.map_err(|e| {
        error!("Live scrape of {} failed: {}", scraper.name(), e);
        AppError::from(e)
    })?;
    Ok(quotes
        .into_iter()
        .filter(|q| params.matches(&[q.ticker.as_str(), q.name.as_str()]))
        .collect())
}

fn market_scraper(state: &AppState, market: AssetMarket) -> Result<Arc<dyn MarketScraper>, AppError> {
    state
        .scrapers
        .for_market(market)
        .ok_or_else(|| AppError::Internal(format!("No scraper registered for {}", market)))
}

async fn live_market(
    state: &AppState,
    market: AssetMarket,
    params: &SearchParams,
) -> Result<Json<ApiResponse<Vec<ScrapedQuote>>>, AppError> {
    let scraper = market_scraper(state, market)?;
    let quotes = scrape_filtered(scraper, params).await?;
    info!("Live {} view returned {} quotes", market, quotes.len());
    Ok(Json(ApiResponse::ok(quotes)))
}

/// GET /stocks?market=nasdaq - one TradingView listing
pub async fn stocks_by_listing(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ScrapedQuote>>>, AppError> {
    let listing = params
        .market
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation("market params missing".to_string()))?;
    info!("GET /stocks - Live listing {}", listing);

    let scraper = state
        .scrapers
        .listing(listing)
        .ok_or_else(|| AppError::Validation(format!("Unknown market: {}", listing)))?;
    let quotes = scrape_filtered(scraper, &params).await?;
    Ok(Json(ApiResponse::ok(quotes)))
}

pub async fn tr_stocks(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ScrapedQuote>>>, AppError> {
    info!("GET /stocks/tr - Live BIST 100");
    live_market(&state, AssetMarket::TrStock, &params).await
}

pub async fn usa_stocks(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ScrapedQuote>>>, AppError> {
    info!("GET /stocks/usa - Live USA stocks");
    live_market(&state, AssetMarket::UsaStock, &params).await
}

pub async fn crypto(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ScrapedQuote>>>, AppError> {
    info!("GET /crypto - Live crypto");
    live_market(&state, AssetMarket::Crypto, &params).await
}

pub async fn commodities(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ScrapedQuote>>>, AppError> {
    info!("GET /commodities - Live gold prices");
    live_market(&state, AssetMarket::Commodity, &params).await
}

pub async fn indices(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ScrapedQuote>>>, AppError> {
    info!("GET /indices - Live indices");
    live_market(&state, AssetMarket::Indices, &params).await
}

pub async fn funds(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ScrapedQuote>>>, AppError> {
    info!("GET /funds - Live funds");
    live_market(&state, AssetMarket::Fund, &params).await
}

pub async fn fund_by_ticker(
    State(state): State<AppState>,
    ValidPath(ticker): ValidPath<String>,
) -> Result<Json<ApiResponse<ScrapedQuote>>, AppError> {
    info!("GET /funds/{} - Live fund", ticker);
    let scraper = market_scraper(&state, AssetMarket::Fund)?;
    let quotes = scrape_filtered(scraper, &SearchParams::default()).await?;
    find_by_ticker(quotes, &ticker)
        .map(|q| Json(ApiResponse::ok(q)))
        .ok_or_else(|| AppError::NotFound(format!("Fund not found with ticker of {}", ticker)))
}

fn find_by_ticker(quotes: Vec<ScrapedQuote>, ticker: &str) -> Option<ScrapedQuote> {
    quotes
        .into_iter()
        .find(|q| q.ticker.eq_ignore_ascii_case(ticker.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;

    fn quote(ticker: &str) -> ScrapedQuote {
        ScrapedQuote {
            ticker: ticker.to_string(),
            name: format!("{} Fund", ticker),
            price: 1.5,
            currency: Currency::Try,
            icon: None,
        }
    }

    #[test]
    fn fund_lookup_ignores_case() {
        let quotes = vec![quote("AFA"), quote("YAC")];
        assert_eq!(find_by_ticker(quotes.clone(), "yac").map(|q| q.ticker), Some("YAC".into()));
        assert!(find_by_ticker(quotes, "ZZZ").is_none());
    }
}
