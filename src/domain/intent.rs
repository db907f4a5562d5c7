//! Per-cycle trade decision.

use rust_decimal::Decimal;

use super::market::split_symbol;
use super::order::{OrderRequest, OrderSide, OrderType};

/// TradeIntent is the ephemeral output of the trade sizer.
///
/// It is consumed immediately by the order executor and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeIntent {
    /// Trading symbol in "BASE/QUOTE" format.
    pub symbol: String,
    pub side: OrderSide,
    /// Order value in quote currency (quantity x price).
    pub quote_amount: Decimal,
    /// Order size in base currency.
    pub quantity: Decimal,
    /// Execution price: market price, or the offset price for limit orders.
    pub price: Decimal,
}

impl TradeIntent {
    pub fn base_currency(&self) -> &str {
        split_symbol(&self.symbol).map(|(b, _)| b).unwrap_or(&self.symbol)
    }

    pub fn quote_currency(&self) -> &str {
        split_symbol(&self.symbol).map(|(_, q)| q).unwrap_or(&self.symbol)
    }

    /// Currency whose balance funds this trade: quote for buys, base for sells.
    pub fn funding_currency(&self) -> &str {
        match self.side {
            OrderSide::Buy => self.quote_currency(),
            OrderSide::Sell => self.base_currency(),
        }
    }

    /// Notional value at the intent price.
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }

    /// Builds the order request sent to the trading facade.
    pub fn to_request(&self, order_type: OrderType) -> OrderRequest {
        OrderRequest {
            symbol: self.symbol.clone(),
            side: self.side,
            order_type,
            quantity: self.quantity,
            price: self.price,
        }
    }
}
