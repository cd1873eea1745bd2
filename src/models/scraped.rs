use chrono::{DateTime, Utc};
use serde::Serialize;

use super::asset::AssetMarket;
use super::currency::Currency;

/// One row extracted from a third-party page, priced in `currency`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScrapedQuote {
    pub ticker: String,
    pub name: String,
    pub price: f64,
    pub currency: Currency,
    pub icon: Option<String>,
}

/// A central bank exchange-rate entry. Prices are TRY per unit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExchangeQuote {
    pub code: String,
    pub name: String,
    pub currency_name: String,
    pub buy: Option<f64>,
    pub sell: f64,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExchangeRatesView {
    #[serde(rename = "try")]
    pub try_: f64,
    pub usd: f64,
    pub eur: f64,
    pub eur_to_usd: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketScrapeResult {
    pub market: AssetMarket,
    pub scraped: usize,
    pub upserted: usize,
    pub failed_batches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarketScrapeResult {
    pub fn failed(market: AssetMarket, error: impl Into<String>) -> Self {
        Self {
            market,
            scraped: 0,
            upserted: 0,
            failed_batches: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed_batches == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub markets: Vec<MarketScrapeResult>,
}

impl ScrapeSummary {
    pub fn upserted(&self) -> usize {
        self.markets.iter().map(|m| m.upserted).sum()
    }

    pub fn failed_markets(&self) -> usize {
        self.markets.iter().filter(|m| !m.is_success()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeStatus {
    pub running: bool,
    pub last_run: Option<ScrapeSummary>,
}
