use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::AssetMarket;
use super::currency::Currency;

/// Reporting window for profit/loss figures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValuationRange {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    #[default]
    All,
}

impl ValuationRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationRange::Daily => "daily",
            ValuationRange::Weekly => "weekly",
            ValuationRange::Monthly => "monthly",
            ValuationRange::Yearly => "yearly",
            ValuationRange::All => "all",
        }
    }

    pub fn window(&self) -> Option<Duration> {
        match self {
            ValuationRange::Daily => Some(Duration::days(1)),
            ValuationRange::Weekly => Some(Duration::days(7)),
            ValuationRange::Monthly => Some(Duration::days(30)),
            ValuationRange::Yearly => Some(Duration::days(365)),
            ValuationRange::All => None,
        }
    }

    /// Earliest instant whose history counts as the window start.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.window().map(|w| now - w)
    }
}

impl std::str::FromStr for ValuationRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ValuationRange::Daily),
            "weekly" => Ok(ValuationRange::Weekly),
            "monthly" => Ok(ValuationRange::Monthly),
            "yearly" => Ok(ValuationRange::Yearly),
            "all" => Ok(ValuationRange::All),
            other => Err(format!("Invalid range: {}", other)),
        }
    }
}

/// Raw query of the valuation endpoints. Parsed by the handler so malformed
/// values surface as validation errors in the JSON envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ValuationQuery {
    pub account_id: Option<String>,
    pub currency: Option<String>,
    pub range: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct BalanceTotals {
    pub balance: f64,
    pub start_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvestmentValuation {
    pub investment_id: Uuid,
    pub asset_id: Uuid,
    pub ticker: String,
    pub name: String,
    pub market: AssetMarket,
    pub amount: f64,
    pub avg_price: f64,
    pub start_price: f64,
    pub current_price: f64,
    pub balance: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketBalance {
    pub market: AssetMarket,
    #[serde(flatten)]
    pub totals: BalanceTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketValuation {
    pub market: AssetMarket,
    #[serde(flatten)]
    pub totals: BalanceTotals,
    pub investments: Vec<InvestmentValuation>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PortfolioValuation {
    pub account_id: Uuid,
    pub currency: Currency,
    pub range: ValuationRange,
    pub markets: Vec<MarketValuation>,
    pub totals: BalanceTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_windows_match_their_names() {
        assert_eq!(ValuationRange::Daily.window(), Some(Duration::days(1)));
        assert_eq!(ValuationRange::Weekly.window(), Some(Duration::days(7)));
        assert_eq!(ValuationRange::Monthly.window(), Some(Duration::days(30)));
        assert_eq!(ValuationRange::Yearly.window(), Some(Duration::days(365)));
        assert_eq!(ValuationRange::All.window(), None);
    }

    #[test]
    fn parses_ranges_and_rejects_unknown() {
        assert_eq!("Weekly".parse::<ValuationRange>().unwrap(), ValuationRange::Weekly);
        assert!("hourly".parse::<ValuationRange>().is_err());
        assert_eq!(ValuationRange::default(), ValuationRange::All);
    }
}
