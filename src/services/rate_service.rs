use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::asset_queries;
use crate::errors::AppError;
use crate::external::tcmb::TcmbScraper;
use crate::models::{AssetMarket, AssetUpsert, Currency, ExchangeRatesView, PriceTriple};
use crate::services::currency_service::CurrencyRates;
use crate::services::ttl_cache::TtlCache;

const RATES_KEY: &str = "try-rates";

/// Where USD/TRY and EUR/TRY come from when the cache is cold.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Rates already stored on the exchange assets, if both exist.
    async fn stored(&self) -> Result<Option<CurrencyRates>, AppError>;

    /// Scrapes the central bank, stores the exchange assets and returns the
    /// fresh rates.
    async fn seed(&self) -> Result<CurrencyRates, AppError>;
}

/// Reads rates from the `exchange` assets and seeds them from TCMB.
pub struct DbRateSource {
    pool: PgPool,
    tcmb: Arc<TcmbScraper>,
}

impl DbRateSource {
    pub fn new(pool: PgPool, tcmb: Arc<TcmbScraper>) -> Self {
        Self { pool, tcmb }
    }
}

#[async_trait]
impl RateSource for DbRateSource {
    async fn stored(&self) -> Result<Option<CurrencyRates>, AppError> {
        let assets = asset_queries::fetch_rate_assets(&self.pool).await?;
        let usd = assets.iter().find(|a| a.ticker == "USD").map(|a| a.price.try_);
        let eur = assets.iter().find(|a| a.ticker == "EUR").map(|a| a.price.try_);

        match (usd, eur) {
            (Some(usd), Some(eur)) => Ok(Some(CurrencyRates::new(usd, eur)?)),
            _ => Ok(None),
        }
    }

    async fn seed(&self) -> Result<CurrencyRates, AppError> {
        let view = self.tcmb.fetch_rates().await?;
        let rates = CurrencyRates::new(view.usd, view.eur)?;
        let rows = rate_assets(&view, &rates);
        asset_queries::upsert_batch(&self.pool, &rows).await?;
        info!("💱 Seeded exchange assets from TCMB (USD={}, EUR={})", view.usd, view.eur);
        Ok(rates)
    }
}

/// The TRY, USD and EUR exchange assets priced in all three currencies.
pub fn rate_assets(view: &ExchangeRatesView, rates: &CurrencyRates) -> Vec<AssetUpsert> {
    let row = |ticker: &str, name: &str, try_price: f64| AssetUpsert {
        ticker: ticker.to_string(),
        name: name.to_string(),
        market: AssetMarket::Exchange,
        currency: Currency::Try,
        price: rates.to_triple(try_price, Currency::Try),
        icon: crate::external::tcmb::flag_icon(ticker),
    };

    vec![
        row("TRY", "TÜRK LİRASI", view.try_),
        row("USD", "ABD DOLARI", view.usd),
        row("EUR", "EURO", view.eur),
    ]
}

/// Current TRY exchange rates behind a short-lived cache.
pub struct RateService {
    cache: TtlCache<&'static str, CurrencyRates>,
    source: Arc<dyn RateSource>,
}

impl RateService {
    pub fn new(source: Arc<dyn RateSource>, ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
            source,
        }
    }

    pub async fn current(&self) -> Result<CurrencyRates, AppError> {
        if let Some(rates) = self.cache.get(&RATES_KEY) {
            return Ok(rates);
        }

        let rates = match self.source.stored().await? {
            Some(rates) => rates,
            None => {
                warn!("Exchange assets missing, seeding rates from TCMB");
                self.source.seed().await.map_err(|e| {
                    AppError::External(format!("Exchange rates unavailable: {}", e))
                })?
            }
        };

        self.cache.insert(RATES_KEY, rates);
        Ok(rates)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate(&RATES_KEY);
    }

    /// Replaces the cached rates without touching the source.
    pub fn prime(&self, rates: CurrencyRates) {
        self.cache.insert(RATES_KEY, rates);
    }

    pub async fn convert_triple(&self, price: f64, from: Currency) -> Result<PriceTriple, AppError> {
        Ok(self.current().await?.to_triple(price, from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        stored: Option<(f64, f64)>,
        seed: Option<(f64, f64)>,
        stored_calls: AtomicUsize,
        seed_calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(stored: Option<(f64, f64)>, seed: Option<(f64, f64)>) -> Arc<Self> {
            Arc::new(Self {
                stored,
                seed,
                stored_calls: AtomicUsize::new(0),
                seed_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn stored(&self) -> Result<Option<CurrencyRates>, AppError> {
            self.stored_calls.fetch_add(1, Ordering::SeqCst);
            match self.stored {
                Some((usd, eur)) => Ok(Some(CurrencyRates::new(usd, eur)?)),
                None => Ok(None),
            }
        }

        async fn seed(&self) -> Result<CurrencyRates, AppError> {
            self.seed_calls.fetch_add(1, Ordering::SeqCst);
            match self.seed {
                Some((usd, eur)) => Ok(CurrencyRates::new(usd, eur)?),
                None => Err(AppError::External("tcmb down".into())),
            }
        }
    }

    #[tokio::test]
    async fn serves_cached_rates_until_invalidated() {
        let source = CountingSource::new(Some((34.0, 37.0)), None);
        let service = RateService::new(source.clone(), Duration::from_secs(600));

        let first = service.current().await.unwrap();
        let second = service.current().await.unwrap();
        assert_eq!(first.usd_rate(), 34.0);
        assert_eq!(second.eur_rate(), 37.0);
        assert_eq!(source.stored_calls.load(Ordering::SeqCst), 1);

        service.invalidate();
        service.current().await.unwrap();
        assert_eq!(source.stored_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_reloaded() {
        let source = CountingSource::new(Some((34.0, 37.0)), None);
        let service = RateService::new(source.clone(), Duration::from_millis(20));

        service.current().await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        service.current().await.unwrap();
        assert_eq!(source.stored_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn seeds_when_exchange_assets_are_missing() {
        let source = CountingSource::new(None, Some((30.0, 33.0)));
        let service = RateService::new(source.clone(), Duration::from_secs(600));

        let rates = service.current().await.unwrap();
        assert_eq!(rates.usd_rate(), 30.0);
        assert_eq!(source.seed_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_rates_are_an_error_not_a_fallback() {
        let source = CountingSource::new(None, None);
        let service = RateService::new(source, Duration::from_secs(600));

        let err = service.current().await.unwrap_err();
        assert!(matches!(err, AppError::External(_)));
    }

    #[tokio::test]
    async fn primed_rates_skip_the_source() {
        let source = CountingSource::new(Some((34.0, 37.0)), None);
        let service = RateService::new(source.clone(), Duration::from_secs(600));

        service.prime(CurrencyRates::new(40.0, 44.0).unwrap());
        let triple = service.convert_triple(2.0, Currency::Usd).await.unwrap();
        assert_eq!(triple.try_, 80.0);
        assert_eq!(source.stored_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rate_assets_are_priced_in_every_currency() {
        let view = ExchangeRatesView {
            try_: 1.0,
            usd: 34.0,
            eur: 37.0,
            eur_to_usd: 37.0 / 34.0,
        };
        let rates = CurrencyRates::new(34.0, 37.0).unwrap();
        let rows = rate_assets(&view, &rates);

        let usd = rows.iter().find(|r| r.ticker == "USD").unwrap();
        assert_eq!(usd.price.try_, 34.0);
        assert!((usd.price.usd - 1.0).abs() < 1e-12);
        let lira = rows.iter().find(|r| r.ticker == "TRY").unwrap();
        assert!((lira.price.usd - 1.0 / 34.0).abs() < 1e-12);
    }
}
