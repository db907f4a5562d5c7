//! Booster error types.

/// Booster error type.
#[derive(Debug, thiserror::Error)]
pub enum BoosterError {
    #[error("volume booster is already running")]
    AlreadyRunning,
    #[error("volume booster is disabled in config")]
    Disabled,
    #[error("no symbols configured")]
    NoSymbols,
    #[error("no trading facade configured")]
    MissingExchange,
    #[error("no config source configured")]
    MissingConfig,
    #[error("trading is not active on {0}")]
    TradingInactive(String),
    #[error("invalid target volume: {0}")]
    InvalidTarget(String),
    #[error("booster loop did not stop within {0:?}")]
    ShutdownTimeout(std::time::Duration),
}

impl BoosterError {
    /// Whether a later start attempt may succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BoosterError::TradingInactive(_) | BoosterError::NoSymbols)
    }
}
