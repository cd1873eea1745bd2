mod account;
mod api;
mod asset;
mod currency;
mod history;
mod investment;
mod job;
mod scraped;
mod transaction;
mod user;
mod valuation;

use std::fmt::Display;
use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::Row;

pub use account::{Account, CreateAccount, UpdateAccount, DEFAULT_ACCOUNT_NAME};
pub use api::{ApiResponse, ListParams, PageRef, Paginated, Pagination, SearchParams};
pub use asset::{Asset, AssetMarket, AssetType, AssetUpsert, CreateAsset, UpdateAsset};
pub use currency::{Currency, CurrencyError, PriceTriple};
pub use history::{CreateHistory, History, UpdateHistory};
pub use investment::{CreateInvestment, Investment, InvestmentWithAsset, UpdateInvestment};
pub use job::JobRun;
pub use scraped::{
    ExchangeQuote, ExchangeRatesView, MarketScrapeResult, ScrapeStatus, ScrapeSummary, ScrapedQuote,
};
pub use transaction::{CreateTransaction, Transaction, TransactionType, UpdateTransaction};
pub use user::{AuthToken, LoginUser, RegisterUser, Role, User};
pub use valuation::{
    BalanceTotals, InvestmentValuation, MarketBalance, MarketValuation, PortfolioValuation,
    ValuationQuery, ValuationRange,
};

/// Reads a TEXT column and parses it into a domain enum.
pub(crate) fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.to_string().into(),
    })
}
