use crate::models::{Currency, CurrencyError, PriceTriple};

/// TRY-based exchange rates: `usd_rate` is "1 USD = N TRY", `eur_rate` is
/// "1 EUR = N TRY".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyRates {
    usd_rate: f64,
    eur_rate: f64,
}

impl CurrencyRates {
    pub fn new(usd_rate: f64, eur_rate: f64) -> Result<Self, CurrencyError> {
        for (currency, value) in [(Currency::Usd, usd_rate), (Currency::Eur, eur_rate)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CurrencyError::InvalidRate { currency, value });
            }
        }
        Ok(Self { usd_rate, eur_rate })
    }

    pub fn usd_rate(&self) -> f64 {
        self.usd_rate
    }

    pub fn eur_rate(&self) -> f64 {
        self.eur_rate
    }

    /// Multiplier turning an amount in `from` into an amount in `to`.
    pub fn rate(&self, from: Currency, to: Currency) -> f64 {
        match (from, to) {
            (a, b) if a == b => 1.0,
            (Currency::Try, Currency::Usd) => 1.0 / self.usd_rate,
            (Currency::Try, Currency::Eur) => 1.0 / self.eur_rate,
            (Currency::Usd, Currency::Try) => self.usd_rate,
            (Currency::Eur, Currency::Try) => self.eur_rate,
            (Currency::Usd, Currency::Eur) => self.usd_rate / self.eur_rate,
            (Currency::Eur, Currency::Usd) => self.eur_rate / self.usd_rate,
            _ => 1.0,
        }
    }

    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> f64 {
        amount * self.rate(from, to)
    }

    pub fn to_triple(&self, price: f64, from: Currency) -> PriceTriple {
        PriceTriple {
            try_: self.convert(price, from, Currency::Try),
            usd: self.convert(price, from, Currency::Usd),
            eur: self.convert(price, from, Currency::Eur),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn matrix_follows_try_based_rates() {
        let rates = CurrencyRates::new(34.0, 37.0).unwrap();
        assert!(close(rates.rate(Currency::Try, Currency::Usd), 1.0 / 34.0));
        assert!(close(rates.rate(Currency::Try, Currency::Eur), 1.0 / 37.0));
        assert!(close(rates.rate(Currency::Usd, Currency::Try), 34.0));
        assert!(close(rates.rate(Currency::Eur, Currency::Try), 37.0));
        assert!(close(rates.rate(Currency::Usd, Currency::Eur), 34.0 / 37.0));
        assert!(close(rates.rate(Currency::Eur, Currency::Usd), 37.0 / 34.0));
        for c in Currency::ALL {
            assert_eq!(rates.rate(c, c), 1.0);
        }
    }

    #[test]
    fn converting_there_and_back_is_identity() {
        let rates = CurrencyRates::new(32.5, 35.1).unwrap();
        for from in Currency::ALL {
            for to in Currency::ALL {
                let back = rates.convert(rates.convert(125.0, from, to), to, from);
                assert!(close(back, 125.0), "{from} -> {to} -> {from} gave {back}");
            }
        }
    }

    #[test]
    fn triple_keeps_source_price_untouched() {
        let rates = CurrencyRates::new(34.0, 37.0).unwrap();
        let triple = rates.to_triple(10.0, Currency::Usd);
        assert_eq!(triple.usd, 10.0);
        assert!(close(triple.try_, 340.0));
        assert!(close(triple.eur, 340.0 / 37.0));

        let lira = rates.to_triple(1.0, Currency::Try);
        assert_eq!(lira.try_, 1.0);
        assert!(close(lira.usd, 1.0 / 34.0));
    }

    #[test]
    fn rejects_non_positive_rates() {
        assert_eq!(
            CurrencyRates::new(0.0, 37.0),
            Err(CurrencyError::InvalidRate {
                currency: Currency::Usd,
                value: 0.0
            })
        );
        assert!(CurrencyRates::new(34.0, f64::NAN).is_err());
    }
}
