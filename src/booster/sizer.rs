//! Trade Sizer: picks the side and size of the next order.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::random::RandomSource;
use super::settings::Settings;
use crate::domain::{OrderSide, OrderType, SymbolLimits, TradeIntent};
use crate::exchanges::utils::round_to_precision;

/// Smallest quote value ever sent, whatever the exchange allows.
pub const DUST_FLOOR: Decimal = Decimal::ONE;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Why the sizer produced no trade this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Price is zero or negative.
    InvalidPrice(Decimal),
    /// Drawn amount could not be represented.
    InvalidAmount,
    /// Quote value after rounding is below `max(min_cost, 1)`.
    BelowFloor { quote: Decimal, floor: Decimal },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidPrice(p) => write!(f, "invalid price {}", p),
            SkipReason::InvalidAmount => write!(f, "amount draw is not representable"),
            SkipReason::BelowFloor { quote, floor } => {
                write!(f, "quote value {} below floor {}", quote, floor)
            }
        }
    }
}

/// Builds the next trade intent for `symbol` at market `price`.
pub fn size_trade(
    symbol: &str,
    price: Decimal,
    limits: &SymbolLimits,
    settings: &Settings,
    random: &mut dyn RandomSource,
) -> Result<TradeIntent, SkipReason> {
    if price <= Decimal::ZERO {
        return Err(SkipReason::InvalidPrice(price));
    }

    let side = if random.choose_buy() {
        OrderSide::Buy
    } else {
        OrderSide::Sell
    };

    let min_cost = limits.min_cost_or_zero();
    let (low, high) = amount_bounds(side, settings, min_cost);

    let drawn = random.uniform(
        low.to_f64().ok_or(SkipReason::InvalidAmount)?,
        high.to_f64().ok_or(SkipReason::InvalidAmount)?,
    );
    let drawn_quote = Decimal::from_f64_retain(drawn).ok_or(SkipReason::InvalidAmount)?;
    let mut quantity = drawn_quote / price;

    if let Some(min_quantity) = limits.min_quantity {
        quantity = quantity.max(min_quantity);
    }
    let quantity = round_to_precision(quantity, limits.amount_precision);

    let execution_price = match settings.order_type {
        OrderType::Market => price,
        OrderType::Limit => limit_price(side, price, settings.price_offset_percent),
    };
    let quote = quantity * execution_price;

    let floor = min_cost.max(DUST_FLOOR);
    if quote < floor {
        return Err(SkipReason::BelowFloor { quote, floor });
    }

    Ok(TradeIntent {
        symbol: symbol.to_string(),
        side,
        quote_amount: quote,
        quantity,
        price: execution_price,
    })
}

/// Quote amount range for a side, with the lower bound raised to `min_cost`.
///
/// A lower bound above the upper bound collapses onto the upper bound.
pub fn amount_bounds(side: OrderSide, settings: &Settings, min_cost: Decimal) -> (Decimal, Decimal) {
    let (min_amount, max_amount) = match side {
        OrderSide::Buy => (settings.min_buy_amount, settings.max_buy_amount),
        OrderSide::Sell => (settings.min_sell_amount, settings.max_sell_amount),
    };
    let low = min_amount.max(min_cost);
    if low > max_amount {
        (max_amount, max_amount)
    } else {
        (low, max_amount)
    }
}

/// Buys rest below the market, sells above.
pub fn limit_price(side: OrderSide, price: Decimal, offset_percent: Decimal) -> Decimal {
    let offset = offset_percent / HUNDRED;
    match side {
        OrderSide::Buy => price * (Decimal::ONE - offset),
        OrderSide::Sell => price * (Decimal::ONE + offset),
    }
}
