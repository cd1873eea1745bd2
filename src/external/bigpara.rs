use async_trait::async_trait;
use tracing::info;

use crate::external::html::{blocks, class_text, class_texts, parse_number, pattern, slugify};
use crate::external::scraper::{fetch_page, MarketScraper, ScraperError};
use crate::models::{AssetMarket, Currency, ScrapedQuote};

pub const GOLD_URL: &str = "https://bigpara.hurriyet.com.tr/altin/ata-altin-fiyati/";

/// Gold prices from Bigpara. Each list row holds a name and the buying and
/// selling prices in TRY; the selling price is used.
pub struct BigparaGoldScraper {
    client: reqwest::Client,
}

impl BigparaGoldScraper {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MarketScraper for BigparaGoldScraper {
    fn name(&self) -> &str {
        "bigpara-gold"
    }

    fn market(&self) -> AssetMarket {
        AssetMarket::Commodity
    }

    async fn fetch(&self) -> Result<Vec<ScrapedQuote>, ScraperError> {
        let html = fetch_page(&self.client, GOLD_URL).await?;
        let quotes = parse_gold_table(&html)?;
        if quotes.is_empty() {
            return Err(ScraperError::EmptyResult(GOLD_URL.to_string()));
        }
        info!("🪙 Bigpara returned {} gold prices", quotes.len());
        Ok(quotes)
    }
}

pub fn parse_gold_table(html: &str) -> Result<Vec<ScrapedQuote>, ScraperError> {
    let body_start = pattern(r#"(?i)class="[^"]*\btBody\b[^"]*""#)?;
    let Some(start) = body_start.find(html) else {
        return Ok(Vec::new());
    };
    let table = &html[start.end()..];

    let mut quotes = Vec::new();
    for row in blocks(table, "ul")? {
        let Some(name) = class_text(row, "cell010")? else {
            continue;
        };
        let prices = class_texts(row, "cell009")?;
        let Some(sell) = prices.get(1).and_then(|p| parse_number(p)) else {
            continue;
        };
        quotes.push(ScrapedQuote {
            ticker: slugify(&name).to_uppercase(),
            name,
            price: sell,
            currency: Currency::Try,
            icon: None,
        });
    }
    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLD_PAGE: &str = r#"
<div class="tableBox">
  <div class="tHead"><ul><li class="cell010">Altın</li><li class="cell009">Alış</li><li class="cell009">Satış</li></ul></div>
  <div class="tBody">
    <ul>
      <li class="cell010 tal"><a href="/altin/gram-altin-fiyati/">Gram Altın</a></li>
      <li class="cell009">2.998,41</li>
      <li class="cell009">2.999,12</li>
    </ul>
    <ul>
      <li class="cell010 tal"><b>Çeyrek Altın</b></li>
      <li class="cell009">4.890,00</li>
      <li class="cell009">4.975,50</li>
    </ul>
    <ul>
      <li class="cell010 tal"><b>Reşat Altın</b></li>
      <li class="cell009">-</li>
    </ul>
  </div>
</div>"#;

    #[test]
    fn parses_selling_prices_from_body_rows() {
        let quotes = parse_gold_table(GOLD_PAGE).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].name, "Gram Altın");
        assert_eq!(quotes[0].ticker, "GRAM-ALTIN");
        assert_eq!(quotes[0].price, 2999.12);
        assert_eq!(quotes[1].ticker, "CEYREK-ALTIN");
        assert_eq!(quotes[1].price, 4975.5);
        assert_eq!(quotes[1].currency, Currency::Try);
    }

    #[test]
    fn page_without_body_yields_nothing() {
        assert!(parse_gold_table("<html></html>").unwrap().is_empty());
    }
}
