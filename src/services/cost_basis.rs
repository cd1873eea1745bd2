use thiserror::Error;

use crate::models::{PriceTriple, Transaction, TransactionType};

const AMOUNT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionLeg {
    pub transaction_type: TransactionType,
    pub quantity: f64,
    pub price: PriceTriple,
}

impl From<&Transaction> for TransactionLeg {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_type: tx.transaction_type,
            quantity: tx.quantity,
            price: tx.price_converted,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Holding {
    pub amount: f64,
    pub avg_price: PriceTriple,
}

#[derive(Debug, Error, PartialEq)]
pub enum CostBasisError {
    #[error("Sell quantity {sold} exceeds held amount {held}")]
    Oversold { held: f64, sold: f64 },
    #[error("Quantity must be a positive number, got {0}")]
    InvalidQuantity(f64),
}

/// Derives the open amount and the weighted average buy price of a position
/// from its full transaction history. `legs` must be in execution order; the
/// held amount may never drop below zero at any point.
pub fn compute(legs: &[TransactionLeg]) -> Result<Holding, CostBasisError> {
    let mut bought = 0.0;
    let mut held: f64 = 0.0;
    let mut cost = PriceTriple::default();

    for leg in legs {
        if !leg.quantity.is_finite() || leg.quantity <= 0.0 {
            return Err(CostBasisError::InvalidQuantity(leg.quantity));
        }
        match leg.transaction_type {
            TransactionType::Buy => {
                bought += leg.quantity;
                held += leg.quantity;
                cost.try_ += leg.price.try_ * leg.quantity;
                cost.usd += leg.price.usd * leg.quantity;
                cost.eur += leg.price.eur * leg.quantity;
            }
            TransactionType::Sell => {
                if held - leg.quantity < -AMOUNT_EPSILON {
                    return Err(CostBasisError::Oversold {
                        held,
                        sold: leg.quantity,
                    });
                }
                held -= leg.quantity;
            }
        }
    }

    let avg_price = if bought > 0.0 {
        cost.map(|total| total / bought)
    } else {
        PriceTriple::default()
    };

    Ok(Holding {
        amount: held.max(0.0),
        avg_price,
    })
}
