use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::currency::{Currency, PriceTriple};
use super::parse_column;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "buy",
            TransactionType::Sell => "sell",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

// Represents a buy or sell event that affects an investment's holding.
// `price_converted` freezes the entered price in all three currencies using
// the rates in force when the transaction was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub investment_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: f64,
    pub price: f64,
    pub currency: Currency,
    pub price_converted: PriceTriple,
    pub executed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Transaction {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            investment_id: row.try_get("investment_id")?,
            transaction_type: parse_column(row, "transaction_type")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
            currency: parse_column(row, "currency")?,
            price_converted: PriceTriple::from_row_prefixed(row, "price")?,
            executed_at: row.try_get("executed_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub investment_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: f64,
    pub price: f64,
    /// Defaults to the native currency of the investment's asset.
    pub currency: Option<Currency>,
    pub executed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTransaction {
    pub transaction_type: Option<TransactionType>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub executed_at: Option<DateTime<Utc>>,
}
