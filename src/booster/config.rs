//! Booster construction options.

use std::sync::Arc;

use super::random::RandomSource;
use crate::config::{ConfigSource, EngineConfig};
use crate::exchanges::Exchange;

/// Everything a [`super::Booster`] is built from.
///
/// Missing collaborators are not a construction error: `start` refuses to
/// run without them.
pub struct BoosterConfig {
    /// Trading facade, market data and portfolio.
    pub exchange: Option<Arc<dyn Exchange>>,
    /// Raw booster settings read on every refresh.
    pub config_source: Option<Arc<dyn ConfigSource>>,
    /// Symbols to boost, in processing order.
    pub symbols: Vec<String>,
    /// Timeouts and refresh interval.
    pub engine: EngineConfig,
    /// Side and amount draws. Entropy-seeded when None.
    pub random: Option<Box<dyn RandomSource>>,
}
