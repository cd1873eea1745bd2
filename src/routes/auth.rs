use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::middleware::auth::AuthUser;
use crate::middleware::validated::ValidJson;
use crate::models::{ApiResponse, AuthToken, LoginUser, RegisterUser, User};
use crate::services::auth_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

pub async fn register(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RegisterUser>,
) -> Result<(StatusCode, Json<ApiResponse<AuthToken>>), AppError> {
    info!("POST /auth/register - Registering {}", input.email);
    let token = auth_service::register(&state.pool, &state.auth, input)
        .await
        .map_err(|e| {
            error!("Failed to register user: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(token))))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<LoginUser>,
) -> Result<Json<ApiResponse<AuthToken>>, AppError> {
    info!("POST /auth/login - Login attempt");
    let token = auth_service::login(&state.pool, &state.auth, input).await?;
    Ok(Json(ApiResponse::ok(token)))
}

pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<ApiResponse<User>>, AppError> {
    info!("GET /auth/me - Fetching user {}", auth.user_id);
    let user = auth_service::me(&state.pool, auth.user_id).await?;
    Ok(Json(ApiResponse::ok(user)))
}
