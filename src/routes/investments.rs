use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::auth::AuthUser;
use crate::middleware::validated::{ValidJson, ValidPath, ValidQuery};
use crate::models::{
    ApiResponse, BalanceTotals, CreateInvestment, Investment, InvestmentWithAsset, ListParams, MarketBalance,
    Paginated, PortfolioValuation, UpdateInvestment, ValuationQuery,
};
use crate::services::investment_service::{self, ValuationRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_investments).post(create_investment))
        .route("/prices", get(investment_prices))
        .route("/total-balance", get(total_balance))
        .route("/market-balance", get(market_balance))
        .route(
            "/:id",
            get(get_investment).put(update_investment).delete(delete_investment),
        )
}

pub async fn list_investments(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Paginated<Investment>>, AppError> {
    info!("GET /investments - Listing investments of user {}", auth.user_id);
    let page = investment_service::list(&state.pool, auth.user_id, &params).await?;
    Ok(Json(page))
}

pub async fn get_investment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<InvestmentWithAsset>>, AppError> {
    info!("GET /investments/{} - Fetching investment", id);
    let investment = investment_service::get(&state.pool, auth.user_id, id).await?;
    Ok(Json(ApiResponse::ok(investment)))
}

pub async fn create_investment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateInvestment>,
) -> Result<(StatusCode, Json<ApiResponse<Investment>>), AppError> {
    info!("POST /investments - Tracking asset {} in account {}", input.asset_id, input.account_id);
    let investment = investment_service::create(&state.pool, auth.user_id, input)
        .await
        .map_err(|e| {
            error!("Failed to create investment: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(investment))))
}

pub async fn update_investment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateInvestment>,
) -> Result<Json<ApiResponse<Investment>>, AppError> {
    info!("PUT /investments/{} - Moving to account {}", id, input.account_id);
    let investment = investment_service::update(&state.pool, auth.user_id, id, input).await?;
    Ok(Json(ApiResponse::ok(investment)))
}

pub async fn delete_investment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    info!("DELETE /investments/{} - Deleting investment", id);
    investment_service::delete(&state.pool, auth.user_id, id).await?;
    Ok(Json(ApiResponse::ok(json!({}))))
}

pub async fn investment_prices(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidQuery(query): ValidQuery<ValuationQuery>,
) -> Result<Json<ApiResponse<PortfolioValuation>>, AppError> {
    let request = ValuationRequest::parse(&query)?;
    info!(
        "GET /investments/prices - account {} in {} over {}",
        request.account_id,
        request.currency,
        request.range.as_str()
    );
    let valuation = investment_service::valuate(&state.pool, auth.user_id, request)
        .await
        .map_err(|e| {
            error!("Failed to value account {}: {}", request.account_id, e);
            e
        })?;
    Ok(Json(ApiResponse::ok(valuation)))
}

pub async fn total_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidQuery(query): ValidQuery<ValuationQuery>,
) -> Result<Json<ApiResponse<BalanceTotals>>, AppError> {
    let request = ValuationRequest::parse(&query)?;
    info!("GET /investments/total-balance - account {}", request.account_id);
    let totals = investment_service::total_balance(&state.pool, auth.user_id, request).await?;
    Ok(Json(ApiResponse::ok(totals)))
}

pub async fn market_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidQuery(query): ValidQuery<ValuationQuery>,
) -> Result<Json<ApiResponse<Vec<MarketBalance>>>, AppError> {
    let request = ValuationRequest::parse(&query)?;
    info!("GET /investments/market-balance - account {}", request.account_id);
    let balances = investment_service::market_balance(&state.pool, auth.user_id, request).await?;
    Ok(Json(ApiResponse::ok(balances)))
}
