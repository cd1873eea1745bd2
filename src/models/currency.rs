use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;
use thiserror::Error;

/// The three currencies every stored price is normalized into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[serde(alias = "TRY")]
    Try,
    #[serde(alias = "USD")]
    Usd,
    #[serde(alias = "EUR")]
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Try, Currency::Usd, Currency::Eur];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Try => "try",
            Currency::Usd => "usd",
            Currency::Eur => "eur",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Usd
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "try" | "tl" => Ok(Currency::Try),
            "usd" => Ok(Currency::Usd),
            "eur" => Ok(Currency::Eur),
            other => Err(CurrencyError::UnknownCurrency(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CurrencyError {
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("invalid {currency} rate: {value}")]
    InvalidRate { currency: Currency, value: f64 },
}

/// One price expressed in TRY, USD and EUR.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceTriple {
    #[serde(rename = "try")]
    pub try_: f64,
    pub usd: f64,
    pub eur: f64,
}

impl PriceTriple {
    pub fn new(try_: f64, usd: f64, eur: f64) -> Self {
        Self { try_, usd, eur }
    }

    pub fn get(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Try => self.try_,
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
        }
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            try_: f(self.try_),
            usd: f(self.usd),
            eur: f(self.eur),
        }
    }

    /// Reads `<prefix>_try`, `<prefix>_usd` and `<prefix>_eur` columns.
    pub(crate) fn from_row_prefixed(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            try_: row.try_get(format!("{prefix}_try").as_str())?,
            usd: row.try_get(format!("{prefix}_usd").as_str())?,
            eur: row.try_get(format!("{prefix}_eur").as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_currency_codes_case_insensitively() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" eur ".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!("try".parse::<Currency>().unwrap(), Currency::Try);
        assert_eq!(
            "gbp".parse::<Currency>(),
            Err(CurrencyError::UnknownCurrency("gbp".to_string()))
        );
    }

    #[test]
    fn price_triple_serializes_with_currency_keys() {
        let triple = PriceTriple::new(340.0, 10.0, 9.0);
        let json = serde_json::to_value(triple).unwrap();
        assert_eq!(json["try"], 340.0);
        assert_eq!(json["usd"], 10.0);
        assert_eq!(json["eur"], 9.0);
        assert_eq!(triple.get(Currency::Try), 340.0);
    }
}
