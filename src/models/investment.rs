use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::asset::Asset;
use super::currency::PriceTriple;

// Represents the holding of one asset within an account. `amount` and
// `avg_price` are derived from the investment's transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub account_id: Uuid,
    pub asset_id: Uuid,
    pub amount: f64,
    pub avg_price: PriceTriple,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Investment {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            asset_id: row.try_get("asset_id")?,
            amount: row.try_get("amount")?,
            avg_price: PriceTriple::from_row_prefixed(row, "avg")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestmentWithAsset {
    #[serde(flatten)]
    pub investment: Investment,
    pub asset: Asset,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInvestment {
    pub account_id: Uuid,
    pub asset_id: Uuid,
}

/// Moves an investment to another account of the same user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateInvestment {
    pub account_id: Uuid,
}
