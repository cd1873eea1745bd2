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
use crate::models::{Account, ApiResponse, CreateAccount, ListParams, Paginated, UpdateAccount};
use crate::services::account_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/:id", get(get_account).put(update_account).delete(delete_account))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Paginated<Account>>, AppError> {
    info!("GET /accounts - Fetching accounts of user {}", auth.user_id);
    let page = account_service::list(&state.pool, auth.user_id, &params)
        .await
        .map_err(|e| {
            error!("Failed to fetch accounts for user {}: {}", auth.user_id, e);
            e
        })?;
    Ok(Json(page))
}

pub async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<Account>>, AppError> {
    info!("GET /accounts/{} - Fetching account", id);
    let account = account_service::get(&state.pool, auth.user_id, id).await?;
    Ok(Json(ApiResponse::ok(account)))
}

pub async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateAccount>,
) -> Result<(StatusCode, Json<ApiResponse<Account>>), AppError> {
    info!("POST /accounts - Creating account for user {}", auth.user_id);
    let account = account_service::create(&state.pool, auth.user_id, input)
        .await
        .map_err(|e| {
            error!("Failed to create account: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(account))))
}

pub async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateAccount>,
) -> Result<Json<ApiResponse<Account>>, AppError> {
    info!("PUT /accounts/{} - Renaming account", id);
    let account = account_service::update(&state.pool, auth.user_id, id, input).await?;
    Ok(Json(ApiResponse::ok(account)))
}

pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    info!("DELETE /accounts/{} - Deleting account", id);
    account_service::delete(&state.pool, auth.user_id, id)
        .await
        .map_err(|e| {
            error!("Failed to delete account {}: {}", id, e);
            e
        })?;
    Ok(Json(ApiResponse::ok(json!({}))))
}
