//! Domain models for volume boosting.

mod intent;
mod market;
mod order;

pub use intent::TradeIntent;
pub use market::{SymbolLimits, split_symbol};
pub use order::{FillOutcome, OrderHandle, OrderRequest, OrderSide, OrderStatus, OrderType};
