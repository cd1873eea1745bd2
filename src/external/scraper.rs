use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::external::bigpara::BigparaGoldScraper;
use crate::external::funds::{IsPortfoyScraper, YapiKrediScraper};
use crate::external::tcmb::TcmbScraper;
use crate::external::tradingview::TradingViewScraper;
use crate::models::{AssetMarket, ScrapedQuote};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no rows extracted from {0}")]
    EmptyResult(String),
}

impl From<reqwest::Error> for ScraperError {
    fn from(value: reqwest::Error) -> Self {
        ScraperError::Network(value.to_string())
    }
}

impl From<regex::Error> for ScraperError {
    fn from(value: regex::Error) -> Self {
        ScraperError::Parse(value.to_string())
    }
}

/// A source of quotes for one market.
#[async_trait]
pub trait MarketScraper: Send + Sync {
    fn name(&self) -> &str;

    fn market(&self) -> AssetMarket;

    async fn fetch(&self) -> Result<Vec<ScrapedQuote>, ScraperError>;
}

/// Shared client for every scraper. Idle connections are kept for five
/// minutes so repeated runs reuse them.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ScraperError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .build()
        .map_err(ScraperError::from)
}

pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String, ScraperError> {
    let resp = client
        .get(url)
        .header("Accept-Language", "en-US,en;q=0.9,tr;q=0.8")
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(ScraperError::BadResponse(format!("{} returned {}", url, resp.status())));
    }

    Ok(resp.text().await?)
}

/// Runs several scrapers of the same market concurrently and keeps the first
/// quote seen for each ticker. Fails only when every source fails.
pub struct MergedScraper {
    name: String,
    market: AssetMarket,
    sources: Vec<Arc<dyn MarketScraper>>,
}

impl MergedScraper {
    pub fn new(name: impl Into<String>, market: AssetMarket, sources: Vec<Arc<dyn MarketScraper>>) -> Self {
        Self {
            name: name.into(),
            market,
            sources,
        }
    }
}

#[async_trait]
impl MarketScraper for MergedScraper {
    fn name(&self) -> &str {
        &self.name
    }

    fn market(&self) -> AssetMarket {
        self.market
    }

    async fn fetch(&self) -> Result<Vec<ScrapedQuote>, ScraperError> {
        let results = join_all(self.sources.iter().map(|s| s.fetch())).await;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut last_error = None;

        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(quotes) => {
                    for quote in quotes {
                        if seen.insert(quote.ticker.clone()) {
                            merged.push(quote);
                        }
                    }
                }
                Err(e) => {
                    warn!("Source {} of {} failed: {}", source.name(), self.name, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if merged.is_empty() => Err(e),
            _ => Ok(merged),
        }
    }
}

/// All scrapers the service knows, keyed by the market they feed.
pub struct ScraperRegistry {
    exchange: Arc<TcmbScraper>,
    markets: HashMap<AssetMarket, Arc<dyn MarketScraper>>,
    tradingview: HashMap<&'static str, Arc<dyn MarketScraper>>,
}

impl ScraperRegistry {
    pub fn new(client: reqwest::Client) -> Self {
        let exchange = Arc::new(TcmbScraper::new(client.clone()));

        let dow: Arc<dyn MarketScraper> = Arc::new(TradingViewScraper::dow_jones(client.clone()));
        let nasdaq: Arc<dyn MarketScraper> = Arc::new(TradingViewScraper::nasdaq_100(client.clone()));
        let sp500: Arc<dyn MarketScraper> = Arc::new(TradingViewScraper::sp_500(client.clone()));
        let electronic: Arc<dyn MarketScraper> =
            Arc::new(TradingViewScraper::electronic_equipment(client.clone()));
        let bist: Arc<dyn MarketScraper> = Arc::new(TradingViewScraper::bist_100(client.clone()));
        let crypto: Arc<dyn MarketScraper> = Arc::new(TradingViewScraper::crypto(client.clone()));
        let indices: Arc<dyn MarketScraper> = Arc::new(TradingViewScraper::indices(client.clone()));

        let usa: Arc<dyn MarketScraper> = Arc::new(MergedScraper::new(
            "usa-stocks",
            AssetMarket::UsaStock,
            vec![dow.clone(), electronic.clone(), nasdaq.clone(), sp500.clone()],
        ));
        let funds: Arc<dyn MarketScraper> = Arc::new(MergedScraper::new(
            "funds",
            AssetMarket::Fund,
            vec![
                Arc::new(IsPortfoyScraper::new(client.clone())),
                Arc::new(YapiKrediScraper::new(client.clone())),
            ],
        ));
        let gold: Arc<dyn MarketScraper> = Arc::new(BigparaGoldScraper::new(client));

        let mut markets: HashMap<AssetMarket, Arc<dyn MarketScraper>> = HashMap::new();
        markets.insert(AssetMarket::Exchange, exchange.clone());
        markets.insert(AssetMarket::UsaStock, usa);
        markets.insert(AssetMarket::TrStock, bist.clone());
        markets.insert(AssetMarket::Crypto, crypto.clone());
        markets.insert(AssetMarket::Indices, indices);
        markets.insert(AssetMarket::Commodity, gold);
        markets.insert(AssetMarket::Fund, funds);

        let mut tradingview: HashMap<&'static str, Arc<dyn MarketScraper>> = HashMap::new();
        tradingview.insert("dow-jones", dow);
        tradingview.insert("nasdaq", nasdaq);
        tradingview.insert("sp500", sp500);
        tradingview.insert("electronic", electronic);
        tradingview.insert("bist100", bist);
        tradingview.insert("crypto", crypto);

        info!("🕸️ Registered {} market scrapers", markets.len());

        Self {
            exchange,
            markets,
            tradingview,
        }
    }

    pub fn exchange(&self) -> Arc<TcmbScraper> {
        self.exchange.clone()
    }

    pub fn for_market(&self, market: AssetMarket) -> Option<Arc<dyn MarketScraper>> {
        self.markets.get(&market).cloned()
    }

    /// A single TradingView listing by its short name (e.g. `nasdaq`).
    pub fn listing(&self, name: &str) -> Option<Arc<dyn MarketScraper>> {
        self.tradingview.get(name).cloned()
    }

    /// Every market except exchange, which is scraped first on its own.
    pub fn non_exchange(&self) -> Vec<Arc<dyn MarketScraper>> {
        AssetMarket::ALL
            .iter()
            .filter(|m| **m != AssetMarket::Exchange)
            .filter_map(|m| self.for_market(*m))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Currency;

    pub(crate) struct StaticScraper {
        pub name: &'static str,
        pub market: AssetMarket,
        pub result: Result<Vec<(&'static str, f64)>, &'static str>,
    }

    #[async_trait]
    impl MarketScraper for StaticScraper {
        fn name(&self) -> &str {
            self.name
        }

        fn market(&self) -> AssetMarket {
            self.market
        }

        async fn fetch(&self) -> Result<Vec<ScrapedQuote>, ScraperError> {
            match &self.result {
                Ok(rows) => Ok(rows
                    .iter()
                    .map(|(ticker, price)| ScrapedQuote {
                        ticker: ticker.to_string(),
                        name: ticker.to_string(),
                        price: *price,
                        currency: Currency::Usd,
                        icon: None,
                    })
                    .collect()),
                Err(msg) => Err(ScraperError::Network(msg.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn merged_scraper_deduplicates_by_first_seen_ticker() {
        let merged = MergedScraper::new(
            "usa",
            AssetMarket::UsaStock,
            vec![
                Arc::new(StaticScraper {
                    name: "dow",
                    market: AssetMarket::UsaStock,
                    result: Ok(vec![("AAPL", 190.0), ("MSFT", 410.0)]),
                }),
                Arc::new(StaticScraper {
                    name: "nasdaq",
                    market: AssetMarket::UsaStock,
                    result: Ok(vec![("AAPL", 191.0), ("NVDA", 120.0)]),
                }),
            ],
        );

        let quotes = merged.fetch().await.unwrap();
        let tickers: Vec<_> = quotes.iter().map(|q| q.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "NVDA"]);
        assert_eq!(quotes[0].price, 190.0);
    }

    #[tokio::test]
    async fn merged_scraper_tolerates_partial_failure() {
        let merged = MergedScraper::new(
            "funds",
            AssetMarket::Fund,
            vec![
                Arc::new(StaticScraper {
                    name: "down",
                    market: AssetMarket::Fund,
                    result: Err("timeout"),
                }),
                Arc::new(StaticScraper {
                    name: "up",
                    market: AssetMarket::Fund,
                    result: Ok(vec![("AFT", 1.5)]),
                }),
            ],
        );
        assert_eq!(merged.fetch().await.unwrap().len(), 1);

        let all_down = MergedScraper::new(
            "funds",
            AssetMarket::Fund,
            vec![Arc::new(StaticScraper {
                name: "down",
                market: AssetMarket::Fund,
                result: Err("timeout"),
            })],
        );
        assert!(matches!(all_down.fetch().await, Err(ScraperError::Network(_))));
    }

    #[test]
    fn registry_covers_every_market() {
        let registry = ScraperRegistry::new(reqwest::Client::new());
        for market in AssetMarket::ALL {
            let scraper = registry.for_market(market).unwrap();
            assert_eq!(scraper.market(), market);
        }
        assert_eq!(registry.non_exchange().len(), AssetMarket::ALL.len() - 1);
        assert!(registry.listing("nasdaq").is_some());
        assert!(registry.listing("ftse").is_none());
    }
}
