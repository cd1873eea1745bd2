use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::currency::{Currency, PriceTriple};
use super::parse_column;

/// Where an asset is traded; also decides its native pricing currency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AssetMarket {
    TrStock,
    UsaStock,
    Exchange,
    Fund,
    Commodity,
    Crypto,
    #[serde(alias = "indicies")]
    Indices,
}

impl AssetMarket {
    pub const ALL: [AssetMarket; 7] = [
        AssetMarket::TrStock,
        AssetMarket::UsaStock,
        AssetMarket::Exchange,
        AssetMarket::Fund,
        AssetMarket::Commodity,
        AssetMarket::Crypto,
        AssetMarket::Indices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetMarket::TrStock => "tr-stock",
            AssetMarket::UsaStock => "usa-stock",
            AssetMarket::Exchange => "exchange",
            AssetMarket::Fund => "fund",
            AssetMarket::Commodity => "commodity",
            AssetMarket::Crypto => "crypto",
            AssetMarket::Indices => "indices",
        }
    }

    pub fn native_currency(&self) -> Currency {
        match self {
            AssetMarket::TrStock
            | AssetMarket::Exchange
            | AssetMarket::Fund
            | AssetMarket::Commodity => Currency::Try,
            AssetMarket::UsaStock | AssetMarket::Crypto | AssetMarket::Indices => Currency::Usd,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AssetMarket::TrStock => "TR Hisse Senetleri",
            AssetMarket::UsaStock => "USA Hisse Senetleri",
            AssetMarket::Exchange => "Döviz",
            AssetMarket::Fund => "Fonlar",
            AssetMarket::Commodity => "Emtia",
            AssetMarket::Crypto => "Kripto",
            AssetMarket::Indices => "Endeksler",
        }
    }
}

impl std::fmt::Display for AssetMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssetMarket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tr-stock" => Ok(AssetMarket::TrStock),
            "usa-stock" => Ok(AssetMarket::UsaStock),
            "exchange" => Ok(AssetMarket::Exchange),
            "fund" => Ok(AssetMarket::Fund),
            "commodity" => Ok(AssetMarket::Commodity),
            "crypto" => Ok(AssetMarket::Crypto),
            "indices" | "indicies" => Ok(AssetMarket::Indices),
            _ => Err(format!("Invalid market type: {}", s)),
        }
    }
}

// A tradable instrument with its latest scraped price in all three currencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub ticker: String,
    pub name: String,
    pub market: AssetMarket,
    pub currency: Currency,
    pub price: PriceTriple,
    pub icon: String,
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Asset {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            ticker: row.try_get("ticker")?,
            name: row.try_get("name")?,
            market: parse_column(row, "market")?,
            currency: parse_column(row, "currency")?,
            price: PriceTriple::from_row_prefixed(row, "price")?,
            icon: row.try_get("icon")?,
            scraped_at: row.try_get("scraped_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Body of `POST /assets`. `price` is given in `currency`, which defaults to
/// the market's native currency.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAsset {
    pub ticker: String,
    pub name: String,
    pub market: AssetMarket,
    pub currency: Option<Currency>,
    pub price: f64,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub currency: Option<Currency>,
    pub price: Option<f64>,
}

/// A fully converted row ready for `INSERT ... ON CONFLICT (ticker, market)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUpsert {
    pub ticker: String,
    pub name: String,
    pub market: AssetMarket,
    pub currency: Currency,
    pub price: PriceTriple,
    pub icon: String,
}

#[derive(Debug, Serialize)]
pub struct AssetType {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub market: AssetMarket,
}

impl AssetType {
    pub fn all() -> Vec<AssetType> {
        AssetMarket::ALL
            .iter()
            .map(|market| AssetType {
                name: market.display_name(),
                market: *market,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_round_trips_through_its_wire_name() {
        for market in AssetMarket::ALL {
            assert_eq!(market.as_str().parse::<AssetMarket>().unwrap(), market);
            let json = serde_json::to_value(market).unwrap();
            assert_eq!(json, market.as_str());
        }
        assert_eq!("indicies".parse::<AssetMarket>().unwrap(), AssetMarket::Indices);
        assert!("bonds".parse::<AssetMarket>().is_err());
    }

    #[test]
    fn native_currency_follows_market() {
        assert_eq!(AssetMarket::TrStock.native_currency(), Currency::Try);
        assert_eq!(AssetMarket::Fund.native_currency(), Currency::Try);
        assert_eq!(AssetMarket::UsaStock.native_currency(), Currency::Usd);
        assert_eq!(AssetMarket::Crypto.native_currency(), Currency::Usd);
        assert_eq!(AssetMarket::Indices.native_currency(), Currency::Usd);
    }
}
