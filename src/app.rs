use axum::Router;
use http::{header, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{
    accounts, assets, auth, exchange, health, histories, investments, jobs, markets, scraping, sms, transactions,
};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let api = Router::<AppState>::new()
        .nest("/auth", auth::router())
        .nest("/accounts", accounts::router())
        .nest("/assets", assets::router())
        .nest("/transactions", transactions::router())
        .nest("/investments", investments::router())
        .nest("/histories", histories::router())
        .nest("/stocks", markets::stocks_router())
        .nest("/crypto", markets::crypto_router())
        .nest("/commodities", markets::commodities_router())
        .nest("/funds", markets::funds_router())
        .nest("/indices", markets::indices_router())
        .nest("/exchange", exchange::router())
        .nest("/scraping", scraping::router())
        .nest("/jobs", jobs::router())
        .nest("/sms", sms::router());

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
