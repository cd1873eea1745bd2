use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::external::scraper::{build_http_client, ScraperRegistry};
use crate::external::twilio::{SmsProvider, TwilioVerify};
use crate::services::auth_service::AuthService;
use crate::services::rate_service::{DbRateSource, RateService};
use crate::services::scraping_service::ScrapingService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub scrapers: Arc<ScraperRegistry>,
    pub rates: Arc<RateService>,
    pub scraping: Arc<ScrapingService>,
    pub sms: Option<Arc<dyn SmsProvider>>,
}

impl AppState {
    /// Wires every shared service around one pool and one HTTP client.
    pub fn build(pool: PgPool, config: AppConfig) -> Result<Self, AppError> {
        let client = build_http_client(config.http_timeout)?;
        let scrapers = Arc::new(ScraperRegistry::new(client.clone()));

        let rate_source = Arc::new(DbRateSource::new(pool.clone(), scrapers.exchange()));
        let rates = Arc::new(RateService::new(rate_source, config.rate_cache_ttl));
        let scraping = Arc::new(ScrapingService::new(
            pool.clone(),
            scrapers.clone(),
            rates.clone(),
            config.upsert_batch_size,
        ));

        let sms: Option<Arc<dyn SmsProvider>> = config
            .twilio
            .clone()
            .map(|twilio| Arc::new(TwilioVerify::new(client, twilio)) as Arc<dyn SmsProvider>);

        Ok(Self {
            pool,
            auth: Arc::new(AuthService::new(&config.jwt_secret, config.jwt_expire_hours)),
            config: Arc::new(config),
            scrapers,
            rates,
            scraping,
            sms,
        })
    }
}
