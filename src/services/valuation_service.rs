use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{
    AssetMarket, BalanceTotals, Currency, InvestmentValuation, InvestmentWithAsset, MarketBalance,
    MarketValuation, PortfolioValuation, PriceTriple, ValuationRange,
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(profit_loss: f64, start_value: f64) -> f64 {
    if start_value == 0.0 {
        0.0
    } else {
        profit_loss / start_value * 100.0
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    balance: f64,
    start_value: f64,
}

impl Accumulator {
    fn add(&mut self, balance: f64, start_value: f64) {
        self.balance += balance;
        self.start_value += start_value;
    }

    fn totals(&self) -> BalanceTotals {
        let profit_loss = self.balance - self.start_value;
        BalanceTotals {
            balance: round2(self.balance),
            start_value: round2(self.start_value),
            profit_loss: round2(profit_loss),
            profit_loss_pct: round2(percentage(profit_loss, self.start_value)),
        }
    }
}

/// Price the range starts from: the earliest close inside the window, or the
/// average cost when the range is `all` or no close falls inside the window.
pub fn start_price(
    holding: &InvestmentWithAsset,
    range: ValuationRange,
    window_close: Option<&PriceTriple>,
    currency: Currency,
) -> f64 {
    match (range, window_close) {
        (ValuationRange::All, _) | (_, None) => holding.investment.avg_price.get(currency),
        (_, Some(close)) => close.get(currency),
    }
}

/// Values every holding in `currency`, grouped by market in a fixed order.
///
/// `window_closes` maps asset ids to their earliest close inside the range.
/// Sums are taken before rounding so totals do not drift.
pub fn valuate(
    account_id: Uuid,
    holdings: &[InvestmentWithAsset],
    window_closes: &HashMap<Uuid, PriceTriple>,
    currency: Currency,
    range: ValuationRange,
) -> PortfolioValuation {
    let mut grouped: HashMap<AssetMarket, (Accumulator, Vec<InvestmentValuation>)> = HashMap::new();
    let mut overall = Accumulator::default();

    for holding in holdings {
        let amount = holding.investment.amount;
        let current = holding.asset.price.get(currency);
        let start = start_price(holding, range, window_closes.get(&holding.asset.id), currency);
        let balance = amount * current;
        let start_value = amount * start;
        let profit_loss = balance - start_value;

        let entry = grouped.entry(holding.asset.market).or_default();
        entry.0.add(balance, start_value);
        overall.add(balance, start_value);
        entry.1.push(InvestmentValuation {
            investment_id: holding.investment.id,
            asset_id: holding.asset.id,
            ticker: holding.asset.ticker.clone(),
            name: holding.asset.name.clone(),
            market: holding.asset.market,
            amount,
            avg_price: round2(holding.investment.avg_price.get(currency)),
            start_price: round2(start),
            current_price: round2(current),
            balance: round2(balance),
            profit_loss: round2(profit_loss),
            profit_loss_pct: round2(percentage(profit_loss, start_value)),
        });
    }

    let markets = AssetMarket::ALL
        .iter()
        .filter_map(|market| {
            grouped.remove(market).map(|(acc, investments)| MarketValuation {
                market: *market,
                totals: acc.totals(),
                investments,
            })
        })
        .collect();

    PortfolioValuation {
        account_id,
        currency,
        range,
        markets,
        totals: overall.totals(),
    }
}

pub fn market_balances(valuation: &PortfolioValuation) -> Vec<MarketBalance> {
    valuation
        .markets
        .iter()
        .map(|m| MarketBalance {
            market: m.market,
            totals: m.totals,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Asset, Investment};
    use chrono::Utc;

    fn holding(market: AssetMarket, amount: f64, avg_usd: f64, current_usd: f64) -> InvestmentWithAsset {
        let now = Utc::now();
        let asset = Asset {
            id: Uuid::new_v4(),
            ticker: format!("T{}", current_usd),
            name: "Test".into(),
            market,
            currency: market.native_currency(),
            price: PriceTriple::new(current_usd * 30.0, current_usd, current_usd * 0.9),
            icon: String::new(),
            scraped_at: now,
            created_at: now,
            updated_at: now,
        };
        InvestmentWithAsset {
            investment: Investment {
                id: Uuid::new_v4(),
                account_id: Uuid::nil(),
                asset_id: asset.id,
                amount,
                avg_price: PriceTriple::new(avg_usd * 30.0, avg_usd, avg_usd * 0.9),
                created_at: now,
                updated_at: now,
            },
            asset,
        }
    }

    #[test]
    fn all_range_measures_against_average_cost() {
        let holdings = vec![holding(AssetMarket::UsaStock, 10.0, 100.0, 120.0)];
        let v = valuate(Uuid::nil(), &holdings, &HashMap::new(), Currency::Usd, ValuationRange::All);

        let line = &v.markets[0].investments[0];
        assert_eq!(line.balance, 1200.0);
        assert_eq!(line.profit_loss, 200.0);
        assert_eq!(line.profit_loss_pct, 20.0);
        assert_eq!(v.totals.profit_loss, 200.0);
    }

    #[test]
    fn windowed_range_uses_earliest_close_when_present() {
        let holdings = vec![holding(AssetMarket::Crypto, 2.0, 100.0, 90.0)];
        let mut closes = HashMap::new();
        closes.insert(holdings[0].asset.id, PriceTriple::new(3000.0, 80.0, 72.0));

        let v = valuate(Uuid::nil(), &holdings, &closes, Currency::Usd, ValuationRange::Weekly);
        let line = &v.markets[0].investments[0];
        assert_eq!(line.start_price, 80.0);
        assert_eq!(line.profit_loss, 20.0);
        assert_eq!(line.profit_loss_pct, 12.5);

        let no_history = valuate(Uuid::nil(), &holdings, &HashMap::new(), Currency::Usd, ValuationRange::Weekly);
        assert_eq!(no_history.markets[0].investments[0].start_price, 100.0);
        assert_eq!(no_history.totals.profit_loss, -20.0);
    }

    #[test]
    fn aggregate_percentage_is_weighted_by_start_value() {
        let holdings = vec![
            holding(AssetMarket::UsaStock, 1.0, 100.0, 150.0),
            holding(AssetMarket::UsaStock, 9.0, 100.0, 100.0),
            holding(AssetMarket::Crypto, 1.0, 50.0, 25.0),
        ];
        let v = valuate(Uuid::nil(), &holdings, &HashMap::new(), Currency::Usd, ValuationRange::All);

        assert_eq!(v.markets.len(), 2);
        assert_eq!(v.markets[0].market, AssetMarket::UsaStock);
        assert_eq!(v.markets[0].totals.profit_loss, 50.0);
        assert_eq!(v.markets[0].totals.profit_loss_pct, 5.0);
        assert_eq!(v.markets[1].totals.profit_loss_pct, -50.0);

        // (50 - 25) / 1050
        assert_eq!(v.totals.profit_loss, 25.0);
        assert_eq!(v.totals.profit_loss_pct, 2.38);

        let balances = market_balances(&v);
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[1].totals.balance, 25.0);
    }

    #[test]
    fn zero_start_value_yields_zero_percentage() {
        let holdings = vec![holding(AssetMarket::Fund, 5.0, 0.0, 10.0)];
        let v = valuate(Uuid::nil(), &holdings, &HashMap::new(), Currency::Usd, ValuationRange::All);
        assert_eq!(v.totals.profit_loss_pct, 0.0);
        assert_eq!(v.totals.profit_loss, 50.0);
    }

    #[test]
    fn values_in_requested_currency() {
        let holdings = vec![holding(AssetMarket::TrStock, 1.0, 10.0, 20.0)];
        let v = valuate(Uuid::nil(), &holdings, &HashMap::new(), Currency::Try, ValuationRange::All);
        assert_eq!(v.totals.balance, 600.0);
        assert_eq!(v.totals.profit_loss, 300.0);
    }
}
