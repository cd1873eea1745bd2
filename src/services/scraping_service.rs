use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::db::asset_queries;
use crate::errors::AppError;
use crate::external::scraper::{MarketScraper, ScraperRegistry};
use crate::external::tcmb::{flag_icon, rates_view};
use crate::models::{
    AssetMarket, AssetUpsert, Currency, ExchangeQuote, MarketScrapeResult, ScrapeStatus, ScrapeSummary,
    ScrapedQuote,
};
use crate::services::currency_service::CurrencyRates;
use crate::services::rate_service::RateService;
use crate::services::run_guard::RunGuard;

/// Scrapes every market, converts quotes into all three currencies and
/// upserts them. Only one run is active at a time.
pub struct ScrapingService {
    pool: PgPool,
    scrapers: Arc<ScraperRegistry>,
    rates: Arc<RateService>,
    batch_size: usize,
    running: AtomicBool,
    last_run: Mutex<Option<ScrapeSummary>>,
}

impl ScrapingService {
    pub fn new(pool: PgPool, scrapers: Arc<ScraperRegistry>, rates: Arc<RateService>, batch_size: usize) -> Self {
        Self {
            pool,
            scrapers,
            rates,
            batch_size: batch_size.max(1),
            running: AtomicBool::new(false),
            last_run: Mutex::new(None),
        }
    }

    pub fn status(&self) -> ScrapeStatus {
        ScrapeStatus {
            running: self.running.load(Ordering::Acquire),
            last_run: self.last_run.lock().clone(),
        }
    }

    /// Exchange first so the other markets convert with fresh rates, then the
    /// rest concurrently.
    pub async fn run_all(&self) -> Result<ScrapeSummary, AppError> {
        let _guard = RunGuard::acquire(&self.running)
            .ok_or_else(|| AppError::Conflict("A scraping run is already in progress".to_string()))?;

        let started_at = Utc::now();
        info!("🕷️ Scraping all markets...");

        let mut markets = vec![self.refresh_exchange().await];

        match self.rates.current().await {
            Ok(rates) => {
                let scrapers = self.scrapers.non_exchange();
                let results = join_all(scrapers.iter().map(|s| self.scrape_and_store(s.as_ref(), &rates))).await;
                markets.extend(results);
            }
            Err(e) => {
                error!("❌ No exchange rates, skipping remaining markets: {}", e);
                markets.extend(
                    AssetMarket::ALL
                        .iter()
                        .filter(|m| **m != AssetMarket::Exchange)
                        .map(|m| MarketScrapeResult::failed(*m, e.to_string())),
                );
            }
        }

        let summary = ScrapeSummary {
            started_at,
            duration_ms: (Utc::now() - started_at).num_milliseconds(),
            markets,
        };
        info!(
            "✅ Scrape finished: {} assets upserted, {} markets failed ({}ms)",
            summary.upserted(),
            summary.failed_markets(),
            summary.duration_ms
        );

        *self.last_run.lock() = Some(summary.clone());
        Ok(summary)
    }

    pub async fn run_market(&self, market: AssetMarket) -> Result<MarketScrapeResult, AppError> {
        let _guard = RunGuard::acquire(&self.running)
            .ok_or_else(|| AppError::Conflict("A scraping run is already in progress".to_string()))?;

        info!("🕷️ Scraping market {}", market);
        if market == AssetMarket::Exchange {
            return Ok(self.refresh_exchange().await);
        }

        let scraper = self
            .scrapers
            .for_market(market)
            .ok_or_else(|| AppError::NotFound(format!("No scraper registered for {}", market)))?;
        let rates = self.rates.current().await?;
        Ok(self.scrape_and_store(scraper.as_ref(), &rates).await)
    }

    /// Stores the central bank rates, refreshes the rate cache and reprices
    /// every asset from its native price.
    async fn refresh_exchange(&self) -> MarketScrapeResult {
        let market = AssetMarket::Exchange;
        let quotes = match self.scrapers.exchange().fetch_exchange().await {
            Ok(quotes) => quotes,
            Err(e) => {
                error!("❌ Exchange scrape failed: {}", e);
                return MarketScrapeResult::failed(market, e.to_string());
            }
        };

        let rates = match rates_view(&quotes)
            .map_err(AppError::from)
            .and_then(|view| CurrencyRates::new(view.usd, view.eur).map_err(AppError::from))
        {
            Ok(rates) => rates,
            Err(e) => {
                error!("❌ Exchange feed has no usable rates: {}", e);
                return MarketScrapeResult::failed(market, e.to_string());
            }
        };

        let rows = exchange_assets(&quotes, &rates);
        let (upserted, failed_batches) = self.upsert_in_batches(market, &rows).await;

        self.rates.invalidate();
        self.rates.prime(rates);

        match asset_queries::reprice_all(&self.pool, &rates).await {
            Ok(n) => info!("💱 Repriced {} assets (USD={}, EUR={})", n, rates.usd_rate(), rates.eur_rate()),
            Err(e) => error!("Failed to reprice assets: {}", e),
        }

        MarketScrapeResult {
            market,
            scraped: quotes.len(),
            upserted,
            failed_batches,
            error: None,
        }
    }

    async fn scrape_and_store(&self, scraper: &dyn MarketScraper, rates: &CurrencyRates) -> MarketScrapeResult {
        let market = scraper.market();
        let quotes = match scraper.fetch().await {
            Ok(quotes) => quotes,
            Err(e) => {
                error!("❌ Scraper {} failed: {}", scraper.name(), e);
                return MarketScrapeResult::failed(market, e.to_string());
            }
        };

        let rows = to_upserts(market, &quotes, rates);
        let (upserted, failed_batches) = self.upsert_in_batches(market, &rows).await;
        info!("📈 {}: scraped {}, upserted {}", market, quotes.len(), upserted);

        MarketScrapeResult {
            market,
            scraped: quotes.len(),
            upserted,
            failed_batches,
            error: None,
        }
    }

    /// Each batch is its own statement; a failing batch does not roll back
    /// the others.
    async fn upsert_in_batches(&self, market: AssetMarket, rows: &[AssetUpsert]) -> (usize, usize) {
        let mut upserted = 0;
        let mut failed = 0;
        for chunk in rows.chunks(self.batch_size) {
            match asset_queries::upsert_batch(&self.pool, chunk).await {
                Ok(n) => upserted += n as usize,
                Err(e) => {
                    warn!("Upsert batch of {} {} assets failed: {}", chunk.len(), market, e);
                    failed += 1;
                }
            }
        }
        (upserted, failed)
    }
}

/// Converts quotes into rows for one market, keeping the first quote of
/// each ticker. The asset's currency is the one the source quoted it in, so
/// repricing starts from the scraped figure.
pub fn to_upserts(market: AssetMarket, quotes: &[ScrapedQuote], rates: &CurrencyRates) -> Vec<AssetUpsert> {
    let mut seen = HashSet::new();
    quotes
        .iter()
        .filter(|q| !q.ticker.is_empty() && q.price.is_finite())
        .filter(|q| seen.insert(q.ticker.clone()))
        .map(|q| AssetUpsert {
            ticker: q.ticker.clone(),
            name: q.name.clone(),
            market,
            currency: q.currency,
            price: rates.to_triple(q.price, q.currency),
            icon: q.icon.clone().unwrap_or_default(),
        })
        .collect()
}

/// Every TCMB currency plus the lira itself, priced in TRY.
pub fn exchange_assets(quotes: &[ExchangeQuote], rates: &CurrencyRates) -> Vec<AssetUpsert> {
    let mut rows: Vec<ScrapedQuote> = vec![ScrapedQuote {
        ticker: "TRY".to_string(),
        name: "TÜRK LİRASI".to_string(),
        price: 1.0,
        currency: Currency::Try,
        icon: Some(flag_icon("TR")),
    }];
    rows.extend(quotes.iter().map(|q| ScrapedQuote {
        ticker: q.code.clone(),
        name: q.name.clone(),
        price: q.sell,
        currency: Currency::Try,
        icon: Some(q.icon.clone()),
    }));
    to_upserts(AssetMarket::Exchange, &rows, rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::tcmb::parse_today_xml;
    use crate::external::tcmb::tests::TODAY_XML;

    fn quote(ticker: &str, price: f64, currency: Currency) -> ScrapedQuote {
        ScrapedQuote {
            ticker: ticker.to_string(),
            name: format!("{} Inc", ticker),
            price,
            currency,
            icon: None,
        }
    }

    #[test]
    fn upserts_keep_first_quote_per_ticker() {
        let rates = CurrencyRates::new(34.0, 37.0).unwrap();
        let quotes = vec![
            quote("AAPL", 200.0, Currency::Usd),
            quote("MSFT", 400.0, Currency::Usd),
            quote("AAPL", 999.0, Currency::Usd),
        ];

        let rows = to_upserts(AssetMarket::UsaStock, &quotes, &rates);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price.usd, 200.0);
        assert_eq!(rows[0].price.try_, 6800.0);
        assert_eq!(rows[0].currency, Currency::Usd);
        assert_eq!(rows[0].icon, "");
    }

    #[test]
    fn quoted_currency_becomes_the_asset_currency() {
        let rates = CurrencyRates::new(34.0, 37.0).unwrap();
        let quotes = vec![quote("SX5E", 5000.0, Currency::Eur)];

        let rows = to_upserts(AssetMarket::Indices, &quotes, &rates);
        assert_eq!(rows[0].currency, Currency::Eur);
        assert_eq!(rows[0].price.eur, 5000.0);
        assert!((rows[0].price.usd - 5000.0 * 37.0 / 34.0).abs() < 1e-9);
    }

    #[test]
    fn exchange_assets_include_lira_and_convert_properly() {
        let quotes = parse_today_xml(TODAY_XML).unwrap();
        let view = rates_view(&quotes).unwrap();
        let rates = CurrencyRates::new(view.usd, view.eur).unwrap();

        let rows = exchange_assets(&quotes, &rates);
        let usd = rows.iter().find(|r| r.ticker == "USD").unwrap();
        assert_eq!(usd.price.try_, 34.3230);
        assert!((usd.price.usd - 1.0).abs() < 1e-12);
        assert!((usd.price.eur - 34.3230 / 37.2185).abs() < 1e-12);

        let lira = rows.iter().find(|r| r.ticker == "TRY").unwrap();
        assert_eq!(lira.price.try_, 1.0);
        assert!(rows.iter().all(|r| r.market == AssetMarket::Exchange));
    }
}
