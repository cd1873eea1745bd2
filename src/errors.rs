use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;
use crate::external::scraper::ScraperError;
use crate::external::twilio::SmsError;
use crate::models::CurrencyError;
use crate::services::cost_basis::CostBasisError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Not authorized to access this route")]
    Unauthorized,
    #[error("External error: {0}")]
    External(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Db(_) | AppError::External(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Db(e) => {
                error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &value {
            if db.is_unique_violation() {
                return AppError::Conflict("Duplicate field value entered".to_string());
            }
        }
        AppError::Db(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        AppError::Validation(value.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(value: PathRejection) -> Self {
        AppError::Validation(value.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(value: QueryRejection) -> Self {
        AppError::Validation(value.body_text())
    }
}

impl From<CurrencyError> for AppError {
    fn from(value: CurrencyError) -> Self {
        match value {
            CurrencyError::UnknownCurrency(_) => AppError::Validation(value.to_string()),
            CurrencyError::InvalidRate { .. } => AppError::Internal(value.to_string()),
        }
    }
}

impl From<CostBasisError> for AppError {
    fn from(value: CostBasisError) -> Self {
        AppError::Validation(value.to_string())
    }
}

impl From<ScraperError> for AppError {
    fn from(value: ScraperError) -> Self {
        AppError::External(value.to_string())
    }
}

impl From<SmsError> for AppError {
    fn from(value: SmsError) -> Self {
        match value {
            SmsError::NotConfigured => AppError::External(value.to_string()),
            SmsError::Rejected(msg) => AppError::Validation(msg),
            other => AppError::External(other.to_string()),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn renders_failure_envelope_with_status() {
        let (status, body) = body_json(AppError::NotFound("No investments found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No investments found");

        let (status, _) = body_json(AppError::Conflict("busy".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = body_json(AppError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn database_details_are_not_leaked() {
        let (status, body) = body_json(AppError::Db(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn domain_errors_map_to_expected_variants() {
        let unknown: AppError = CurrencyError::UnknownCurrency("gbp".into()).into();
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let oversold: AppError = CostBasisError::Oversold {
            held: 1.0,
            sold: 2.0,
        }
        .into();
        assert_eq!(oversold.status(), StatusCode::BAD_REQUEST);

        let scrape: AppError = ScraperError::EmptyResult("tcmb".into()).into();
        assert_eq!(scrape.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
