use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::middleware::validated::ValidQuery;
use crate::models::{ApiResponse, ExchangeQuote, ExchangeRatesView, SearchParams};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(exchange_quotes))
        .route("/rates", get(exchange_rates))
}

/// GET /exchange - Live central bank quotes, filterable by code or name
pub async fn exchange_quotes(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ExchangeQuote>>>, AppError> {
    info!("GET /exchange - Live exchange quotes");
    let quotes = state.scrapers.exchange().fetch_exchange().await.map_err(|e| {
        error!("Failed to fetch exchange quotes: {}", e);
        AppError::from(e)
    })?;
    let quotes: Vec<ExchangeQuote> = quotes
        .into_iter()
        .filter(|q| params.matches(&[q.code.as_str(), q.name.as_str(), q.currency_name.as_str()]))
        .collect();
    Ok(Json(ApiResponse::ok(quotes)))
}

/// GET /exchange/rates - TRY, USD and EUR rates plus EUR/USD
pub async fn exchange_rates(State(state): State<AppState>) -> Result<Json<ApiResponse<ExchangeRatesView>>, AppError> {
    info!("GET /exchange/rates - Live rates");
    let rates = state.scrapers.exchange().fetch_rates().await?;
    Ok(Json(ApiResponse::ok(rates)))
}
