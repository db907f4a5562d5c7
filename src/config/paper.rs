//! Paper trading configuration.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Simulated exchange settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    /// Whether simulated trading is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fee taken from the received asset, as a decimal (e.g., "0.001" for 0.1%).
    pub fee_rate: Option<Decimal>,
    /// Starting balances keyed by currency (e.g., "USDT").
    #[serde(default)]
    pub balances: HashMap<String, Decimal>,
    /// Markets keyed by "BASE/QUOTE" symbol.
    #[serde(default)]
    pub markets: HashMap<String, PaperMarketConfig>,
}

/// Price and trading rules for one simulated market.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperMarketConfig {
    pub price: Decimal,
    pub min_quantity: Option<Decimal>,
    pub min_cost: Option<Decimal>,
    pub amount_precision: Option<u32>,
}

fn default_true() -> bool {
    true
}
