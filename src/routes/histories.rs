use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::validated::{ValidJson, ValidPath, ValidQuery};
use crate::models::{ApiResponse, CreateHistory, History, ListParams, Paginated, UpdateHistory};
use crate::services::history_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_histories).post(create_history))
        .route("/:id", get(get_history).put(update_history).delete(delete_history))
}

pub async fn list_histories(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Paginated<History>>, AppError> {
    info!("GET /histories - Listing histories (asset={:?})", params.asset_id);
    Ok(Json(history_service::list(&state.pool, &params).await?))
}

pub async fn get_history(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<History>>, AppError> {
    info!("GET /histories/{} - Fetching history", id);
    Ok(Json(ApiResponse::ok(history_service::get(&state.pool, id).await?)))
}

pub async fn create_history(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateHistory>,
) -> Result<(StatusCode, Json<ApiResponse<History>>), AppError> {
    info!("POST /histories - Recording close for asset {}", input.asset_id);
    let history = history_service::create(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(history))))
}

pub async fn update_history(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateHistory>,
) -> Result<Json<ApiResponse<History>>, AppError> {
    info!("PUT /histories/{} - Updating close", id);
    Ok(Json(ApiResponse::ok(history_service::update(&state.pool, id, input).await?)))
}

pub async fn delete_history(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    info!("DELETE /histories/{} - Deleting history", id);
    history_service::delete(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok(json!({}))))
}
