use async_trait::async_trait;
use tracing::info;

use crate::external::html::{blocks, cells, class_text, parse_number};
use crate::external::scraper::{fetch_page, MarketScraper, ScraperError};
use crate::models::{AssetMarket, Currency, ScrapedQuote};

pub const IS_PORTFOY_URL: &str = "https://www.isportfoy.com.tr/getiri-ve-fiyatlar";
pub const YAPI_KREDI_URL: &str = "https://www.yapikredi.com.tr/yatirimci-kosesi/fon-bilgileri";

fn fund_quote(code: &str, name: &str, price: Option<f64>) -> Option<ScrapedQuote> {
    let code = code.trim();
    let name = name.trim();
    match price {
        Some(price) if !code.is_empty() && !name.is_empty() && price > 0.0 => Some(ScrapedQuote {
            ticker: code.to_string(),
            name: name.to_string(),
            price,
            currency: Currency::Try,
            icon: None,
        }),
        _ => None,
    }
}

fn table_body(html: &str) -> Result<Vec<&str>, ScraperError> {
    let bodies = blocks(html, "tbody")?;
    let mut rows = Vec::new();
    for body in bodies {
        rows.extend(blocks(body, "tr")?);
    }
    Ok(rows)
}

pub struct IsPortfoyScraper {
    client: reqwest::Client,
}

impl IsPortfoyScraper {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MarketScraper for IsPortfoyScraper {
    fn name(&self) -> &str {
        "isportfoy"
    }

    fn market(&self) -> AssetMarket {
        AssetMarket::Fund
    }

    async fn fetch(&self) -> Result<Vec<ScrapedQuote>, ScraperError> {
        let html = fetch_page(&self.client, IS_PORTFOY_URL).await?;
        let quotes = parse_is_portfoy(&html)?;
        info!("🏦 İş Portföy returned {} funds", quotes.len());
        Ok(quotes)
    }
}

/// Rows carry the name in `a.fund-name`, the code in `.table-code` and the
/// unit price in the third cell.
pub fn parse_is_portfoy(html: &str) -> Result<Vec<ScrapedQuote>, ScraperError> {
    let mut quotes = Vec::new();
    for row in table_body(html)? {
        let name = class_text(row, "fund-name")?.unwrap_or_default();
        let code = class_text(row, "table-code")?.unwrap_or_default();
        let price = cells(row)?.get(2).and_then(|c| parse_number(c));
        quotes.extend(fund_quote(&code, &name, price));
    }
    Ok(quotes)
}

pub struct YapiKrediScraper {
    client: reqwest::Client,
}

impl YapiKrediScraper {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MarketScraper for YapiKrediScraper {
    fn name(&self) -> &str {
        "yapikredi"
    }

    fn market(&self) -> AssetMarket {
        AssetMarket::Fund
    }

    async fn fetch(&self) -> Result<Vec<ScrapedQuote>, ScraperError> {
        let html = fetch_page(&self.client, YAPI_KREDI_URL).await?;
        let quotes = parse_yapi_kredi(&html)?;
        info!("🏦 Yapı Kredi returned {} funds", quotes.len());
        Ok(quotes)
    }
}

/// First cell reads `CODE / Company`, second holds the fund name, third
/// starts with the unit price.
pub fn parse_yapi_kredi(html: &str) -> Result<Vec<ScrapedQuote>, ScraperError> {
    let mut quotes = Vec::new();
    for row in table_body(html)? {
        let row_cells = cells(row)?;
        if row_cells.len() < 3 {
            continue;
        }
        let code = row_cells[0].split(" /").next().unwrap_or_default();
        let price = row_cells[2].split_whitespace().next().and_then(parse_number);
        quotes.extend(fund_quote(code, &row_cells[1], price));
    }
    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_is_portfoy_table() {
        let html = r#"
<table><thead><tr><th>Fon</th><th>Getiri</th><th>Fiyat</th></tr></thead>
<tbody>
  <tr>
    <td><a class="fund-name" href="/fon/ipv">İş Portföy Para Piyasası Fonu</a><div class="table-code">IPV</div></td>
    <td data-value="45.1">%45,10</td>
    <td data-value="1.234567">
        1,234567
    </td>
  </tr>
  <tr><td><a class="fund-name">Eksik Fiyat</a><div class="table-code">XXX</div></td><td></td><td></td></tr>
</tbody></table>"#;

        let quotes = parse_is_portfoy(html).unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].ticker, "IPV");
        assert_eq!(quotes[0].name, "İş Portföy Para Piyasası Fonu");
        assert_eq!(quotes[0].price, 1.234567);
        assert_eq!(quotes[0].currency, Currency::Try);
    }

    #[test]
    fn parses_yapi_kredi_table() {
        let html = r#"
<table><tbody>
  <tr>
    <td><a href="/fon/yas">YAS / Yapı Kredi Portföy</a></td>
    <td><a href="/fon/yas">Yapı Kredi Portföy Koç Holding İştirak Hisse Senedi Fonu</a></td>
    <td>3,456789
        <span>TL</span></td>
  </tr>
  <tr><td>Toplam</td></tr>
</tbody></table>"#;

        let quotes = parse_yapi_kredi(html).unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].ticker, "YAS");
        assert_eq!(quotes[0].price, 3.456789);
    }
}
