use async_trait::async_trait;
use tracing::info;

use crate::external::html::{blocks, parse_number, pattern, strip_tags};
use crate::external::scraper::{fetch_page, MarketScraper, ScraperError};
use crate::models::{AssetMarket, Currency, ExchangeQuote, ExchangeRatesView, ScrapedQuote};

pub const TCMB_TODAY_URL: &str = "https://www.tcmb.gov.tr/kurlar/today.xml";

/// Central Bank of the Republic of Türkiye daily rates.
pub struct TcmbScraper {
    client: reqwest::Client,
    url: String,
}

impl TcmbScraper {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: TCMB_TODAY_URL.to_string(),
        }
    }

    pub async fn fetch_exchange(&self) -> Result<Vec<ExchangeQuote>, ScraperError> {
        let xml = fetch_page(&self.client, &self.url).await?;
        let quotes = parse_today_xml(&xml)?;
        if quotes.is_empty() {
            return Err(ScraperError::EmptyResult(self.url.clone()));
        }
        info!("💱 TCMB returned {} exchange rates", quotes.len());
        Ok(quotes)
    }

    pub async fn fetch_rates(&self) -> Result<ExchangeRatesView, ScraperError> {
        let quotes = self.fetch_exchange().await?;
        rates_view(&quotes)
    }
}

#[async_trait]
impl MarketScraper for TcmbScraper {
    fn name(&self) -> &str {
        "tcmb"
    }

    fn market(&self) -> AssetMarket {
        AssetMarket::Exchange
    }

    async fn fetch(&self) -> Result<Vec<ScrapedQuote>, ScraperError> {
        Ok(self
            .fetch_exchange()
            .await?
            .into_iter()
            .map(|q| ScrapedQuote {
                ticker: q.code,
                name: q.name,
                price: q.sell,
                currency: Currency::Try,
                icon: Some(q.icon),
            })
            .collect())
    }
}

pub fn flag_icon(code: &str) -> String {
    let country: String = code.chars().take(2).collect::<String>().to_lowercase();
    format!("https://flagcdn.com/w40/{}.png", country)
}

fn child(fragment: &str, tag: &str) -> Result<Option<String>, ScraperError> {
    Ok(blocks(fragment, tag)?.first().map(|s| strip_tags(s)))
}

/// Parses `today.xml`. Entries without a banknote selling price are dropped.
pub fn parse_today_xml(xml: &str) -> Result<Vec<ExchangeQuote>, ScraperError> {
    let entry = pattern(r#"(?s)<Currency\b([^>]*)>(.*?)</Currency>"#)?;
    let code_attr = pattern(r#"CurrencyCode="([^"]+)""#)?;

    let mut quotes = Vec::new();
    for caps in entry.captures_iter(xml) {
        let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        let Some(code) = code_attr
            .captures(attrs)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };

        let Some(sell) = child(body, "BanknoteSelling")?.as_deref().and_then(parse_number) else {
            continue;
        };

        quotes.push(ExchangeQuote {
            icon: flag_icon(&code),
            name: child(body, "Isim")?.unwrap_or_else(|| code.clone()),
            currency_name: child(body, "CurrencyName")?.unwrap_or_default(),
            buy: child(body, "BanknoteBuying")?.as_deref().and_then(parse_number),
            sell,
            code,
        });
    }
    Ok(quotes)
}

pub fn rates_view(quotes: &[ExchangeQuote]) -> Result<ExchangeRatesView, ScraperError> {
    let find = |code: &str| {
        quotes
            .iter()
            .find(|q| q.code == code)
            .map(|q| q.sell)
            .ok_or_else(|| ScraperError::Parse(format!("{} rate missing from TCMB feed", code)))
    };
    let usd = find("USD")?;
    let eur = find("EUR")?;
    Ok(ExchangeRatesView {
        try_: 1.0,
        usd,
        eur,
        eur_to_usd: eur / usd,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TODAY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Tarih_Date Tarih="18.10.2026" Date="10/18/2026" Bulten_No="2026/199">
  <Currency CrossOrder="0" Kod="USD" CurrencyCode="USD">
    <Unit>1</Unit>
    <Isim>ABD DOLARI</Isim>
    <CurrencyName>US DOLLAR</CurrencyName>
    <ForexBuying>34.2100</ForexBuying>
    <ForexSelling>34.2716</ForexSelling>
    <BanknoteBuying>34.1861</BanknoteBuying>
    <BanknoteSelling>34.3230</BanknoteSelling>
  </Currency>
  <Currency CrossOrder="9" Kod="EUR" CurrencyCode="EUR">
    <Unit>1</Unit>
    <Isim>EURO</Isim>
    <CurrencyName>EURO</CurrencyName>
    <BanknoteBuying>37.0700</BanknoteBuying>
    <BanknoteSelling>37.2185</BanknoteSelling>
  </Currency>
  <Currency CrossOrder="20" Kod="XDR" CurrencyCode="XDR">
    <Unit>1</Unit>
    <Isim>ÖZEL ÇEKME HAKKI (SDR)</Isim>
    <CurrencyName>SPECIAL DRAWING RIGHT (SDR)</CurrencyName>
    <BanknoteBuying></BanknoteBuying>
    <BanknoteSelling></BanknoteSelling>
  </Currency>
</Tarih_Date>"#;

    #[test]
    fn parses_rates_and_drops_entries_without_selling_price() {
        let quotes = parse_today_xml(TODAY_XML).unwrap();
        assert_eq!(quotes.len(), 2);

        let usd = &quotes[0];
        assert_eq!(usd.code, "USD");
        assert_eq!(usd.name, "ABD DOLARI");
        assert_eq!(usd.currency_name, "US DOLLAR");
        assert_eq!(usd.sell, 34.323);
        assert_eq!(usd.buy, Some(34.1861));
        assert_eq!(usd.icon, "https://flagcdn.com/w40/us.png");
    }

    #[test]
    fn builds_rates_view_from_usd_and_eur() {
        let view = rates_view(&parse_today_xml(TODAY_XML).unwrap()).unwrap();
        assert_eq!(view.try_, 1.0);
        assert_eq!(view.usd, 34.323);
        assert_eq!(view.eur, 37.2185);
        assert!((view.eur_to_usd - 37.2185 / 34.323).abs() < 1e-12);

        assert!(rates_view(&[]).is_err());
    }
}
