use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::currency::PriceTriple;

// Represents the daily close of an asset in all three currencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub recorded_on: NaiveDate,
    pub close_price: PriceTriple,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for History {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            asset_id: row.try_get("asset_id")?,
            recorded_on: row.try_get("recorded_on")?,
            close_price: PriceTriple::from_row_prefixed(row, "close")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateHistory {
    pub asset_id: Uuid,
    pub recorded_on: Option<NaiveDate>,
    pub close_price: PriceTriple,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateHistory {
    pub close_price: PriceTriple,
}
