//! Market metadata used to size orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange-imposed limits for a single trading symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolLimits {
    /// Minimum order quantity in base currency.
    #[serde(default)]
    pub min_quantity: Option<Decimal>,
    /// Minimum order notional in quote currency.
    #[serde(default)]
    pub min_cost: Option<Decimal>,
    /// Number of decimal places allowed for the order quantity.
    #[serde(default)]
    pub amount_precision: Option<u32>,
}

impl SymbolLimits {
    /// Minimum quantity, zero when the exchange declares none.
    pub fn min_quantity_or_zero(&self) -> Decimal {
        self.min_quantity.unwrap_or(Decimal::ZERO)
    }

    /// Minimum notional, zero when the exchange declares none.
    pub fn min_cost_or_zero(&self) -> Decimal {
        self.min_cost.unwrap_or(Decimal::ZERO)
    }
}

/// Splits "BTC/USDT" into ("BTC", "USDT").
///
/// Returns None unless the symbol has exactly one '/' with non-empty sides.
pub fn split_symbol(symbol: &str) -> Option<(&str, &str)> {
    let (base, quote) = symbol.split_once('/')?;
    if base.is_empty() || quote.is_empty() || quote.contains('/') {
        return None;
    }
    Some((base, quote))
}
