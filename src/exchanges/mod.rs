//! Collaborator abstractions consumed by the booster engine.
//!
//! The engine talks to three services: a trading facade that accepts orders,
//! a market data source for prices and symbol limits, and a portfolio for
//! available balances. A concrete exchange usually provides all three, which
//! is what the [`Exchange`] umbrella trait expresses.

mod paper;
pub mod utils;

use crate::domain::{OrderHandle, OrderRequest, SymbolLimits};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

pub use paper::{PaperExchange, PaperMarket};

/// Exchange errors.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Trading symbol is not supported by this exchange.
    #[error("symbol {0} is not supported")]
    PairNotSupported(String),

    /// Insufficient funds for the operation.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Order is below the exchange's minimum quantity or notional.
    #[error("order too small: {0}")]
    OrderTooSmall(String),

    /// Order type is not available for this symbol.
    #[error("order type not supported: {0}")]
    OrderTypeNotSupported(String),

    /// Exchange refused the order.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// Too many requests.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Call did not complete in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// API error from the exchange.
    #[error("API error: {0}")]
    Api(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classification of a failed order attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InsufficientFunds,
    SizeTooSmall,
    OrderTypeUnsupported,
    Rejected,
    RateLimited,
    Unknown,
}

impl FailureKind {
    /// Whether the failure counts against the order statistics.
    ///
    /// Orders that were too small never reached the book and are not counted.
    pub fn counts_as_failure(self) -> bool {
        !matches!(self, FailureKind::SizeTooSmall)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::InsufficientFunds => "insufficient_funds",
            FailureKind::SizeTooSmall => "size_too_small",
            FailureKind::OrderTypeUnsupported => "order_type_unsupported",
            FailureKind::Rejected => "rejected",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl ExchangeError {
    /// Maps the error onto the engine's failure taxonomy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ExchangeError::InsufficientFunds(_) => FailureKind::InsufficientFunds,
            ExchangeError::OrderTooSmall(_) => FailureKind::SizeTooSmall,
            ExchangeError::OrderTypeNotSupported(_) => FailureKind::OrderTypeUnsupported,
            ExchangeError::Rejected(_) => FailureKind::Rejected,
            ExchangeError::RateLimited(_) => FailureKind::RateLimited,
            ExchangeError::PairNotSupported(_)
            | ExchangeError::Timeout(_)
            | ExchangeError::Connection(_)
            | ExchangeError::Api(_)
            | ExchangeError::Internal(_) => FailureKind::Unknown,
        }
    }
}

/// Result type for exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// TradingFacade accepts order requests and reports their lifecycle.
#[async_trait]
pub trait TradingFacade: Send + Sync {
    /// Returns true when real or simulated trading is active.
    fn is_trading_enabled(&self) -> bool;

    /// Submits a market or limit order.
    /// Returns None when the facade declined to create the order without
    /// a specific error.
    async fn create_order(&self, request: OrderRequest) -> Result<Option<OrderHandle>>;
}

/// MarketData provides prices and trading rules.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Last traded price for a "BASE/QUOTE" symbol, None when no ticker is available.
    async fn get_price(&self, symbol: &str) -> Result<Option<Decimal>>;

    /// Exchange limits for a symbol, None when the market status is unknown.
    async fn get_symbol_limits(&self, symbol: &str) -> Result<Option<SymbolLimits>>;
}

/// Portfolio exposes available (unlocked) balances.
#[async_trait]
pub trait Portfolio: Send + Sync {
    /// Available amount of a currency (e.g., "BTC", "USDT"), None when unknown.
    async fn get_available_balance(&self, currency: &str) -> Result<Option<Decimal>>;
}

/// Exchange bundles the three collaborators the engine needs.
pub trait Exchange: TradingFacade + MarketData + Portfolio {
    /// Unique identifier of this exchange (e.g., "paper", "binance").
    fn name(&self) -> &str;
}
