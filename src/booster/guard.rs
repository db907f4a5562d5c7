//! Balance Guard: keeps every order inside a safe share of the balance.
//!
//! An intent needs `required * 1.05` of the funding currency (quote for
//! buys, base for sells). When that would use more than 80% of what is
//! available, the intent is shrunk to 95% of the 80% cap instead of being
//! rejected.

use rust_decimal::Decimal;
use thiserror::Error;

use super::sizer::DUST_FLOOR;
use crate::domain::{OrderSide, SymbolLimits, TradeIntent};
use crate::exchanges::utils::truncate_to_precision;

/// Safety margin for fees and slippage.
pub const BUFFER_FACTOR: Decimal = Decimal::from_parts(105, 0, 0, false, 2);
/// Largest share of the available balance one order may use.
pub const USAGE_CAP: Decimal = Decimal::from_parts(80, 0, 0, false, 2);
/// Share of the cap an oversized order is shrunk to.
pub const SHRINK_FACTOR: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

/// Why the guard refused an intent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuardRejection {
    #[error("insufficient-balance: {available} {currency} available, {required} required")]
    InsufficientBalance {
        currency: String,
        available: Decimal,
        required: Decimal,
    },
    #[error("balance-unavailable: no balance reported for {currency}")]
    BalanceUnavailable { currency: String },
}

/// Checks `intent` against the available balance of its funding currency.
///
/// Returns the intent unchanged, a shrunk copy, or the rejection reason.
pub fn check_balance(
    intent: &TradeIntent,
    available: Option<Decimal>,
    limits: &SymbolLimits,
) -> Result<TradeIntent, GuardRejection> {
    let currency = intent.funding_currency().to_string();
    let Some(available) = available else {
        return Err(GuardRejection::BalanceUnavailable { currency });
    };

    let required = required_amount(intent);
    let buffered = required * BUFFER_FACTOR;
    if available < buffered {
        return Err(GuardRejection::InsufficientBalance {
            currency,
            available,
            required: buffered,
        });
    }

    let cap = available * USAGE_CAP;
    if buffered <= cap {
        return Ok(intent.clone());
    }

    let allowed = cap * SHRINK_FACTOR;
    let quantity = match intent.side {
        OrderSide::Buy => allowed / intent.price,
        OrderSide::Sell => allowed,
    };
    let quantity = truncate_to_precision(quantity, limits.amount_precision);
    let quote_amount = quantity * intent.price;

    if quantity <= Decimal::ZERO
        || quantity < limits.min_quantity_or_zero()
        || quote_amount < limits.min_cost_or_zero().max(DUST_FLOOR)
    {
        return Err(GuardRejection::InsufficientBalance {
            currency,
            available,
            required: buffered,
        });
    }

    Ok(TradeIntent {
        quantity,
        quote_amount,
        ..intent.clone()
    })
}

/// Amount of the funding currency the intent spends.
fn required_amount(intent: &TradeIntent) -> Decimal {
    match intent.side {
        OrderSide::Buy => intent.quote_amount,
        OrderSide::Sell => intent.quantity,
    }
}
