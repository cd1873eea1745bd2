pub mod accounts;
pub mod assets;
pub mod auth;
pub mod exchange;
pub mod health;
pub mod histories;
pub mod investments;
pub mod jobs;
pub mod markets;
pub mod scraping;
pub mod sms;
pub mod transactions;

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::app::create_app;
    use crate::config::AppConfig;
    use crate::state::AppState;

    // The pool never connects; every request below is answered before the
    // handler reaches the database.
    fn test_state() -> AppState {
        let config = AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost:5432/assetfolio_test".to_string()),
            "JWT_SECRET" => Some("test-secret".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::build(pool, config).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(create_app(test_state()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["scraping"], false);
    }

    #[tokio::test]
    async fn owner_scoped_routes_require_a_token() {
        let (status, body) = send(create_app(test_state()), get("/api/v1/accounts")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let request = Request::builder()
            .uri("/api/v1/investments")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(create_app(test_state()), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valuation_requires_an_account_id() {
        let state = test_state();
        let token = state.auth.issue_token(Uuid::new_v4()).unwrap();
        let request = Request::builder()
            .uri("/api/v1/investments/prices?currency=USD&range=weekly")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(create_app(state), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "account_id is required");
    }

    fn authed(method: &str, uri: &str, body: Body) -> Request<Body> {
        let token = crate::services::auth_service::AuthService::new("test-secret", 1)
            .issue_token(Uuid::new_v4())
            .unwrap();
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let body = Body::from(format!(
            r#"{{"investment_id":"{}","transaction_type":"hold","quantity":1,"price":10}}"#,
            Uuid::new_v4()
        ));
        let (status, body) = send(
            create_app(test_state()),
            authed("POST", "/api/v1/transactions", body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let (status, body) = send(
            create_app(test_state()),
            authed("GET", "/api/v1/investments/not-a-uuid", Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn malformed_query_is_a_validation_error() {
        let (status, body) = send(create_app(test_state()), get("/api/v1/assets?page=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unknown_scrape_market_is_rejected() {
        let (status, body) = send(create_app(test_state()), get("/api/v1/scraping/bonds")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn stock_listing_needs_a_market() {
        let (status, body) = send(create_app(test_state()), get("/api/v1/stocks")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "market params missing");
    }

    #[tokio::test]
    async fn asset_types_cover_every_market() {
        let (status, body) = send(create_app(test_state()), get("/api/v1/assets/types")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(7));
    }

    #[tokio::test]
    async fn registration_rejects_malformed_email() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"fullname":"Ada","email":"not-an-email","phone":"+905551112233","password":"secret1"}"#,
            ))
            .unwrap();
        let (status, body) = send(create_app(test_state()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn sms_without_provider_is_an_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/sms/send-verification-code")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"to":"+905551112233"}"#))
            .unwrap();
        let (status, body) = send(create_app(test_state()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "External error: SMS verification is not configured");
    }
}
