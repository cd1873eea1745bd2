use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::validated::{ValidJson, ValidPath, ValidQuery};
use crate::models::{ApiResponse, Asset, AssetType, CreateAsset, ListParams, Paginated, UpdateAsset};
use crate::services::asset_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/types", get(asset_types))
        .route("/trends", get(trend_assets))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
}

pub async fn list_assets(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Paginated<Asset>>, AppError> {
    info!("GET /assets - Listing assets (market={:?}, search={:?})", params.market, params.search);
    let page = asset_service::list(&state.pool, &params).await.map_err(|e| {
        error!("Failed to list assets: {}", e);
        e
    })?;
    Ok(Json(page))
}

pub async fn get_asset(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<Asset>>, AppError> {
    info!("GET /assets/{} - Fetching asset", id);
    let asset = asset_service::get(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(asset)))
}

pub async fn create_asset(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateAsset>,
) -> Result<(StatusCode, Json<ApiResponse<Asset>>), AppError> {
    info!("POST /assets - Creating asset {} ({})", input.ticker, input.market);
    let asset = asset_service::create(&state.pool, &state.rates, input)
        .await
        .map_err(|e| {
            error!("Failed to create asset: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(asset))))
}

pub async fn update_asset(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateAsset>,
) -> Result<Json<ApiResponse<Asset>>, AppError> {
    info!("PUT /assets/{} - Updating asset", id);
    let asset = asset_service::update(&state.pool, &state.rates, id, input).await?;
    Ok(Json(ApiResponse::ok(asset)))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    info!("DELETE /assets/{} - Deleting asset", id);
    asset_service::delete(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(json!({}))))
}

pub async fn asset_types() -> Json<ApiResponse<Vec<AssetType>>> {
    info!("GET /assets/types - Listing asset types");
    Json(ApiResponse::ok(AssetType::all()))
}

pub async fn trend_assets(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Asset>>>, AppError> {
    info!("GET /assets/trends - Fetching trend assets");
    let assets = asset_service::trends(&state.pool).await?;
    Ok(Json(ApiResponse::ok(assets)))
}
