use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::middleware::validated::ValidJson;
use crate::external::twilio::{SmsError, SmsProvider, Verification};
use crate::models::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-verification-code", post(send_verification_code))
        .route("/verify-verification-code", post(verify_verification_code))
}

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub to: String,
    pub code: String,
}

fn provider(state: &AppState) -> Result<Arc<dyn SmsProvider>, AppError> {
    state.sms.clone().ok_or_else(|| SmsError::NotConfigured.into())
}

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub async fn send_verification_code(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<SendCodeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Verification>>), AppError> {
    require(&input.to, "to")?;
    let sms = provider(&state)?;
    info!("POST /sms/send-verification-code - Sending code");
    let verification = sms.send_code(input.to.trim()).await.map_err(|e| {
        error!("Failed to send verification code: {}", e);
        AppError::from(e)
    })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(verification))))
}

pub async fn verify_verification_code(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<VerifyCodeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Verification>>), AppError> {
    require(&input.to, "to")?;
    require(&input.code, "code")?;
    let sms = provider(&state)?;
    info!("POST /sms/verify-verification-code - Checking code");
    let verification = sms.check_code(input.to.trim(), input.code.trim()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(verification))))
}
