use async_trait::async_trait;
use tracing::info;

use crate::external::html::{blocks, cells, class_text, image_src, parse_number};
use crate::external::scraper::{fetch_page, MarketScraper, ScraperError};
use crate::models::{AssetMarket, Currency, ScrapedQuote};

pub const DOW_JONES_URL: &str = "https://tr.tradingview.com/symbols/DJ-DJI/components";
pub const NASDAQ_100_URL: &str = "https://tr.tradingview.com/symbols/NASDAQ-NDX/components";
pub const SP_500_URL: &str = "https://tr.tradingview.com/symbols/SPX/components/?exchange=SP";
pub const ELECTRONIC_EQUIPMENT_URL: &str =
    "https://www.tradingview.com/markets/stocks-usa/sectorandindustry-industry/electronic-production-equipment";
pub const BIST_100_URL: &str = "https://tr.tradingview.com/symbols/BIST-XU100/components";
pub const CRYPTO_URL: &str = "https://tradingview.com/markets/cryptocurrencies/prices-all";
pub const INDICES_URL: &str = "https://www.tradingview.com/markets/indices/quotes-major/";

/// A TradingView listing table. Each row carries the ticker, a description,
/// a logo and a price cell such as `190.50 USD`.
pub struct TradingViewScraper {
    client: reqwest::Client,
    name: &'static str,
    url: &'static str,
    market: AssetMarket,
    price_column: usize,
}

impl TradingViewScraper {
    fn new(
        client: reqwest::Client,
        name: &'static str,
        url: &'static str,
        market: AssetMarket,
        price_column: usize,
    ) -> Self {
        Self {
            client,
            name,
            url,
            market,
            price_column,
        }
    }

    pub fn dow_jones(client: reqwest::Client) -> Self {
        Self::new(client, "dow-jones", DOW_JONES_URL, AssetMarket::UsaStock, 2)
    }

    pub fn nasdaq_100(client: reqwest::Client) -> Self {
        Self::new(client, "nasdaq", NASDAQ_100_URL, AssetMarket::UsaStock, 2)
    }

    pub fn sp_500(client: reqwest::Client) -> Self {
        Self::new(client, "sp500", SP_500_URL, AssetMarket::UsaStock, 2)
    }

    pub fn electronic_equipment(client: reqwest::Client) -> Self {
        Self::new(client, "electronic", ELECTRONIC_EQUIPMENT_URL, AssetMarket::UsaStock, 2)
    }

    pub fn bist_100(client: reqwest::Client) -> Self {
        Self::new(client, "bist100", BIST_100_URL, AssetMarket::TrStock, 2)
    }

    pub fn crypto(client: reqwest::Client) -> Self {
        Self::new(client, "crypto", CRYPTO_URL, AssetMarket::Crypto, 2)
    }

    pub fn indices(client: reqwest::Client) -> Self {
        Self::new(client, "indices", INDICES_URL, AssetMarket::Indices, 1)
    }
}

#[async_trait]
impl MarketScraper for TradingViewScraper {
    fn name(&self) -> &str {
        self.name
    }

    fn market(&self) -> AssetMarket {
        self.market
    }

    async fn fetch(&self) -> Result<Vec<ScrapedQuote>, ScraperError> {
        let html = fetch_page(&self.client, self.url).await?;
        let quotes = parse_listing(&html, self.price_column, self.market.native_currency())?;
        if quotes.is_empty() {
            return Err(ScraperError::EmptyResult(self.url.to_string()));
        }
        info!("📈 {} returned {} rows", self.name, quotes.len());
        Ok(quotes)
    }
}

/// Extracts one quote per table row that has a ticker and a numeric price.
/// The currency code after the price wins over `default_currency` when it
/// is one we track. Duplicate tickers keep their first row.
pub fn parse_listing(
    html: &str,
    price_column: usize,
    default_currency: Currency,
) -> Result<Vec<ScrapedQuote>, ScraperError> {
    let mut quotes: Vec<ScrapedQuote> = Vec::new();

    for row in blocks(html, "tr")? {
        let Some(ticker) = class_text(row, "tickerName")? else {
            continue;
        };
        if quotes.iter().any(|q| q.ticker == ticker) {
            continue;
        }

        let row_cells = cells(row)?;
        let Some(price_cell) = row_cells.get(price_column) else {
            continue;
        };
        let mut parts = price_cell.split_whitespace();
        let Some(price) = parts.next().and_then(parse_number) else {
            continue;
        };
        let currency = parts
            .next()
            .and_then(|code| code.parse::<Currency>().ok())
            .unwrap_or(default_currency);

        quotes.push(ScrapedQuote {
            name: class_text(row, "tickerDescription")?.unwrap_or_else(|| ticker.clone()),
            icon: image_src(row, "tickerLogo")?,
            ticker,
            price,
            currency,
        });
    }

    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENTS: &str = r#"
<table><thead><tr><th>Symbol</th><th>Change</th><th>Price</th></tr></thead>
<tbody>
<tr class="row-RdUXZpkv" data-rowkey="NASDAQ:AAPL">
  <td><img class="logo-PsAlMQQF tickerLogo-GrtoTeat" src="https://s3-symbol-logo.tradingview.com/apple.svg" alt="">
    <a class="apply-common-tooltip tickerNameBox-GrtoTeat" href="/symbols/NASDAQ-AAPL/">AAPL</a>
    <sup class="apply-common-tooltip tickerDescription-GrtoTeat">Apple Inc.</sup></td>
  <td>+1.20%</td>
  <td>231.30&nbsp;USD</td>
</tr>
<tr class="row-RdUXZpkv" data-rowkey="NASDAQ:MSFT">
  <td><a class="tickerNameBox-GrtoTeat" href="/symbols/NASDAQ-MSFT/">MSFT</a>
    <sup class="tickerDescription-GrtoTeat">Microsoft Corporation</sup></td>
  <td>&#8722;0.40%</td>
  <td>1,412.05 USD</td>
</tr>
<tr class="row-RdUXZpkv" data-rowkey="NASDAQ:AAPL">
  <td><a class="tickerNameBox-GrtoTeat">AAPL</a></td><td>0</td><td>1.00 USD</td>
</tr>
<tr><td><a class="tickerNameBox-GrtoTeat">HALT</a></td><td>0</td><td>—</td></tr>
</tbody></table>"#;

    #[test]
    fn parses_component_rows() {
        let quotes = parse_listing(COMPONENTS, 2, Currency::Usd).unwrap();
        assert_eq!(quotes.len(), 2);

        assert_eq!(quotes[0].ticker, "AAPL");
        assert_eq!(quotes[0].name, "Apple Inc.");
        assert_eq!(quotes[0].price, 231.30);
        assert_eq!(quotes[0].currency, Currency::Usd);
        assert_eq!(
            quotes[0].icon.as_deref(),
            Some("https://s3-symbol-logo.tradingview.com/apple.svg")
        );

        assert_eq!(quotes[1].ticker, "MSFT");
        assert_eq!(quotes[1].price, 1412.05);
        assert_eq!(quotes[1].icon, None);
    }

    #[test]
    fn falls_back_to_market_currency() {
        let html = r#"<tr><td><a class="tickerNameBox-x">THYAO</a></td><td>0</td><td>312,50</td></tr>"#;
        let quotes = parse_listing(html, 2, Currency::Try).unwrap();
        assert_eq!(quotes[0].price, 312.5);
        assert_eq!(quotes[0].currency, Currency::Try);
    }
}
