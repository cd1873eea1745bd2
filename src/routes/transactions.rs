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
use crate::models::{ApiResponse, CreateTransaction, ListParams, Paginated, Transaction, UpdateTransaction};
use crate::services::transaction_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route(
            "/:id",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
}

pub async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Paginated<Transaction>>, AppError> {
    info!("GET /transactions - Listing transactions of user {}", auth.user_id);
    let page = transaction_service::list(&state.pool, auth.user_id, &params).await?;
    Ok(Json(page))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    info!("GET /transactions/{} - Fetching transaction", id);
    let transaction = transaction_service::get(&state.pool, auth.user_id, id).await?;
    Ok(Json(ApiResponse::ok(transaction)))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateTransaction>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), AppError> {
    info!(
        "POST /transactions - {} {} for investment {}",
        input.transaction_type.as_str(),
        input.quantity,
        input.investment_id
    );
    let transaction = transaction_service::create(&state.pool, &state.rates, auth.user_id, input)
        .await
        .map_err(|e| {
            error!("Failed to create transaction: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(transaction))))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateTransaction>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    info!("PUT /transactions/{} - Updating transaction", id);
    let transaction = transaction_service::update(&state.pool, &state.rates, auth.user_id, id, input)
        .await
        .map_err(|e| {
            error!("Failed to update transaction {}: {}", id, e);
            e
        })?;
    Ok(Json(ApiResponse::ok(transaction)))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    info!("DELETE /transactions/{} - Deleting transaction", id);
    transaction_service::delete(&state.pool, auth.user_id, id)
        .await
        .map_err(|e| {
            error!("Failed to delete transaction {}: {}", id, e);
            e
        })?;
    Ok(Json(ApiResponse::ok(json!({}))))
}
