use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::middleware::validated::ValidPath;
use crate::models::{ApiResponse, AssetMarket, MarketScrapeResult, ScrapeStatus, ScrapeSummary};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scrape_all))
        .route("/status", get(scrape_status))
        .route("/:market", get(scrape_market))
}

/// GET /scraping - Scrape every market now. 409 while another run is active.
pub async fn scrape_all(State(state): State<AppState>) -> Result<Json<ApiResponse<ScrapeSummary>>, AppError> {
    info!("GET /scraping - Manual scrape of all markets");
    let summary = state.scraping.run_all().await.map_err(|e| {
        error!("Manual scrape failed: {}", e);
        e
    })?;
    Ok(Json(ApiResponse::ok(summary)))
}

pub async fn scrape_status(State(state): State<AppState>) -> Json<ApiResponse<ScrapeStatus>> {
    Json(ApiResponse::ok(state.scraping.status()))
}

pub async fn scrape_market(
    State(state): State<AppState>,
    ValidPath(market): ValidPath<String>,
) -> Result<Json<ApiResponse<MarketScrapeResult>>, AppError> {
    let market: AssetMarket = market.parse().map_err(AppError::Validation)?;
    info!("GET /scraping/{} - Manual scrape", market);
    let result = state.scraping.run_market(market).await.map_err(|e| {
        error!("Manual scrape of {} failed: {}", market, e);
        e
    })?;
    Ok(Json(ApiResponse::ok(result)))
}
