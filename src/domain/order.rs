//! Core business entities for orders sent to the trading facade.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OrderSide represents the direction of an order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Spend quote currency to receive base currency.
    Buy,
    /// Spend base currency to receive quote currency.
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// OrderType represents the type of order execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Executes at the specified price or better.
    Limit,
    /// Executes immediately at the best available price.
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "limit"),
            OrderType::Market => write!(f, "market"),
        }
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "limit" => Ok(OrderType::Limit),
            "market" => Ok(OrderType::Market),
            _ => Err(format!("unknown order type: {}", s)),
        }
    }
}

/// OrderStatus is the state reported by the trading facade for a created order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted but not yet on the book.
    Pending,
    /// Resting on the book, waiting to be filled.
    Open,
    /// Some quantity has been filled.
    PartiallyFilled,
    /// Completely filled.
    Filled,
    /// Cancelled before being filled.
    Canceled,
    /// Refused by the exchange.
    Rejected,
}

/// How the engine accounts for an order in a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Filled notional is credited.
    Executed,
    /// Order is live; the intended notional is credited provisionally.
    Provisional,
    /// Order did not trade.
    Failed,
}

impl OrderStatus {
    /// Classifies the status for volume accounting.
    pub fn outcome(self) -> FillOutcome {
        match self {
            OrderStatus::Filled | OrderStatus::PartiallyFilled => FillOutcome::Executed,
            OrderStatus::Pending | OrderStatus::Open => FillOutcome::Provisional,
            OrderStatus::Canceled | OrderStatus::Rejected => FillOutcome::Failed,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Open => "open",
            OrderStatus::PartiallyFilled => "partially_filled",
            OrderStatus::Filled => "filled",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// OrderRequest is what the engine submits to the trading facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Trading symbol in "BASE/QUOTE" format (e.g., "BTC/USDT").
    pub symbol: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Amount of base currency to buy or sell.
    pub quantity: Decimal,
    /// Limit price; reference price for market orders.
    pub price: Decimal,
}

/// OrderHandle is returned by the trading facade for a created order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHandle {
    /// Unique identifier assigned by the exchange.
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    /// Base quantity filled so far.
    pub filled_quantity: Decimal,
    /// Average fill price, zero when nothing has been filled.
    pub filled_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl OrderHandle {
    /// Returns the filled notional (quantity x price) in quote currency.
    pub fn filled_notional(&self) -> Decimal {
        self.filled_quantity * self.filled_price
    }
}
