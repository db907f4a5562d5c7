//! Volume booster engine.
//!
//! Places randomized buy and sell orders over a list of symbols until the
//! cumulative traded notional reaches the target volume. Each attempt runs
//! Trade Sizer -> Balance Guard -> Order Executor, and the Backoff
//! Controller paces attempts and slows down after failures.
//!
//! The loop runs as a single spawned task. Host calls (`stop`, `status`,
//! `reset_volume`, `update_target_volume`) go through the same mutexes the
//! loop uses, so they always observe a consistent state.

pub mod backoff;
mod config;
mod error;
pub mod executor;
pub mod guard;
pub mod random;
pub mod settings;
pub mod sizer;
mod state;
mod stats;
mod status;
pub mod supervisor;
pub mod validation;

pub use backoff::Backoff;
pub use config::BoosterConfig;
pub use error::BoosterError;
pub use random::{FixedRandom, RandomSource, ThreadRandom};
pub use settings::{ConfigCache, Settings};
pub use state::{BoosterPhase, BoosterState};
pub use stats::Stats;
pub use status::StatusSnapshot;
pub use supervisor::{RetryPolicy, Supervisor, SupervisorOutcome};

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::SymbolLimits;
use crate::exchanges::{self, Exchange};
use executor::ExecutionOutcome;
use guard::GuardRejection;

const DEFAULT_MARKET_DATA_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
/// Extra wait for booking an order whose submission outlived the shutdown timeout.
const SUBMIT_GRACE: Duration = Duration::from_secs(1);

/// Why the loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    TargetReached,
    Requested,
    Disabled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TargetReached => write!(f, "target reached"),
            StopReason::Requested => write!(f, "stop requested"),
            StopReason::Disabled => write!(f, "disabled in config"),
        }
    }
}

/// Result of one market-data call.
enum Lookup<T> {
    Found(T),
    Missing(String),
    Cancelled,
}

/// Result of one per-symbol attempt.
enum Attempt {
    Booked(ExecutionOutcome),
    Skipped,
    Cancelled,
}

/// State shared between the host handle and the loop task.
struct Shared {
    exchange: Option<Arc<dyn Exchange>>,
    symbols: Vec<String>,
    market_data_timeout: Duration,
    order_timeout: Duration,
    shutdown_timeout: Duration,
    /// Set while an order is out at the facade and not yet booked.
    submitting: AtomicBool,
    backoff: Backoff,
    cache: Option<Mutex<ConfigCache>>,
    state: Mutex<BoosterState>,
    stats: Mutex<Stats>,
    random: std::sync::Mutex<Box<dyn RandomSource>>,
}

/// Volume booster handle owned by the host.
pub struct Booster {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
    cancel: Mutex<CancellationToken>,
}

fn or_default(value: Duration, default: Duration) -> Duration {
    if value.is_zero() { default } else { value }
}

impl Booster {
    /// Creates an idle booster.
    pub fn new(cfg: BoosterConfig) -> Self {
        let engine = cfg.engine;
        let cache = cfg
            .config_source
            .map(|source| Mutex::new(ConfigCache::new(source, engine.config_refresh_interval)));

        let shared = Shared {
            exchange: cfg.exchange,
            symbols: cfg.symbols,
            market_data_timeout: or_default(engine.market_data_timeout, DEFAULT_MARKET_DATA_TIMEOUT),
            order_timeout: or_default(engine.order_timeout, DEFAULT_ORDER_TIMEOUT),
            shutdown_timeout: or_default(engine.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT),
            submitting: AtomicBool::new(false),
            backoff: Backoff::default(),
            cache,
            state: Mutex::new(BoosterState::new(settings::DEFAULT_VOLUME_TARGET)),
            stats: Mutex::new(Stats::default()),
            random: std::sync::Mutex::new(
                cfg.random
                    .unwrap_or_else(|| Box::new(ThreadRandom::new())),
            ),
        };

        Self {
            shared: Arc::new(shared),
            task: Mutex::new(None),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Replaces the pacing parameters. Takes effect on the next start.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.backoff = backoff;
        }
        self
    }

    /// Starts the loop. Returns false, and stays idle, when a start guard fails.
    pub async fn start(&self) -> bool {
        match self.try_start().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Volume booster not started");
                false
            }
        }
    }

    /// Starts the loop, reporting why it could not.
    pub async fn try_start(&self) -> Result<(), BoosterError> {
        let shared = &self.shared;
        let cache = shared.cache.as_ref().ok_or(BoosterError::MissingConfig)?;
        let exchange = shared.exchange.as_ref().ok_or(BoosterError::MissingExchange)?;

        let settings = cache.lock().await.refresh().clone();
        if !settings.enabled {
            return Err(BoosterError::Disabled);
        }
        if shared.symbols.is_empty() {
            return Err(BoosterError::NoSymbols);
        }
        if !exchange.is_trading_enabled() {
            return Err(BoosterError::TradingInactive(exchange.name().to_string()));
        }

        {
            let mut state = shared.state.lock().await;
            if matches!(state.phase, BoosterPhase::Running | BoosterPhase::Stopping) {
                return Err(BoosterError::AlreadyRunning);
            }
            state.phase = BoosterPhase::Running;
            state.should_stop = false;
            state.target_volume = settings.volume_target;
            state.started_at = Some(Utc::now());
        }

        let estimate = validation::estimate_runtime(&settings);
        info!(
            exchange = exchange.name(),
            symbols = ?shared.symbols,
            target_volume = %settings.volume_target,
            order_type = %settings.order_type,
            estimated_trades = estimate.estimated_trades,
            estimated_runtime = ?estimate.estimated_runtime,
            "Starting volume booster"
        );

        let cancel = CancellationToken::new();
        *self.cancel.lock().await = cancel.clone();

        let handle = tokio::spawn(Shared::run(Arc::clone(shared), cancel));
        *self.task.lock().await = Some(handle);

        Ok(())
    }

    /// Stops the loop and waits for it to unwind. Safe to call repeatedly.
    pub async fn stop(&self) {
        if let Err(e) = self.shutdown().await {
            warn!(error = %e, "Volume booster task aborted");
        }
    }

    async fn shutdown(&self) -> Result<(), BoosterError> {
        {
            let mut state = self.shared.state.lock().await;
            state.should_stop = true;
            if state.phase == BoosterPhase::Running {
                state.phase = BoosterPhase::Stopping;
                info!("Stopping volume booster...");
            }
        }

        self.cancel.lock().await.cancel();

        let mut result = Ok(());
        let handle = self.task.lock().await.take();
        let had_task = handle.is_some();
        if let Some(mut handle) = handle {
            let mut waited = tokio::time::timeout(self.shared.shutdown_timeout, &mut handle).await;
            if waited.is_err() && self.shared.submitting.load(Ordering::Acquire) {
                let grace = self.shared.order_timeout + SUBMIT_GRACE;
                info!(wait = ?grace, "Waiting for in-flight order to be booked");
                waited = tokio::time::timeout(grace, &mut handle).await;
            }
            match waited {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Volume booster task ended abnormally"),
                Err(_) => {
                    handle.abort();
                    result = Err(BoosterError::ShutdownTimeout(self.shared.shutdown_timeout));
                }
            }
        }

        let mut state = self.shared.state.lock().await;
        if state.phase != BoosterPhase::Idle {
            state.phase = BoosterPhase::Stopped;
        }
        if had_task {
            info!(current_volume = %state.current_volume, "Volume booster stopped");
        }

        result
    }

    /// Progress snapshot.
    pub async fn status(&self) -> StatusSnapshot {
        StatusSnapshot::from_state(&*self.shared.state.lock().await)
    }

    /// Returns a copy of the session statistics.
    pub async fn stats(&self) -> Stats {
        self.shared.stats.lock().await.clone()
    }

    pub async fn phase(&self) -> BoosterPhase {
        self.shared.state.lock().await.phase
    }

    pub async fn is_running(&self) -> bool {
        self.shared.state.lock().await.is_running()
    }

    pub async fn should_stop(&self) -> bool {
        self.shared.state.lock().await.should_stop
    }

    /// Time since the last start, zero if never started.
    pub async fn uptime(&self) -> Duration {
        self.shared
            .state
            .lock()
            .await
            .started_at
            .and_then(|at| (Utc::now() - at).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    /// Current settings snapshot, None without a config source.
    pub async fn settings(&self) -> Option<Settings> {
        match &self.shared.cache {
            Some(cache) => Some(cache.lock().await.settings().clone()),
            None => None,
        }
    }

    /// Sets the current volume back to zero. Target and statistics are kept.
    pub async fn reset_volume(&self) {
        self.shared.state.lock().await.current_volume = Decimal::ZERO;
        info!("Volume counter reset");
    }

    /// Replaces the target; the loop sees it on its next stop check.
    pub async fn update_target_volume(&self, target: Decimal) -> Result<(), BoosterError> {
        if target <= Decimal::ZERO {
            return Err(BoosterError::InvalidTarget(target.to_string()));
        }
        self.shared.state.lock().await.target_volume = target;
        info!(target_volume = %target, "Target volume updated");
        Ok(())
    }
}

impl Drop for Booster {
    fn drop(&mut self) {
        self.cancel.get_mut().cancel();
    }
}

impl Shared {
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let reason = self.boost_until_done(&cancel).await;

        let mut state = self.state.lock().await;
        state.phase = BoosterPhase::Stopped;
        match reason {
            StopReason::TargetReached => info!(
                current_volume = %state.current_volume,
                target_volume = %state.target_volume,
                "Volume target reached"
            ),
            other => info!(reason = %other, "Volume booster loop exited"),
        }
    }

    async fn boost_until_done(&self, cancel: &CancellationToken) -> StopReason {
        let mut previous: Option<exchanges::FailureKind> = None;
        loop {
            if let Some(reason) = self.stop_reason(cancel).await {
                return reason;
            }
            if let Some(cache) = &self.cache {
                cache.lock().await.refresh_if_stale();
            }
            if let Some(reason) = self.stop_reason(cancel).await {
                return reason;
            }

            let cycle = {
                let mut stats = self.stats.lock().await;
                stats.cycles += 1;
                stats.cycles
            };
            debug!(cycle, symbols = self.symbols.len(), "Boosting cycle");

            for symbol in &self.symbols {
                if let Some(reason) = self.stop_reason(cancel).await {
                    return reason;
                }

                let failures = self.stats.lock().await.consecutive_failures;
                if let Some(cooldown) = self.backoff.cooldown_after(previous, failures) {
                    info!(
                        symbol = %symbol,
                        consecutive_failures = failures,
                        cooldown = ?cooldown,
                        "Cooling down after consecutive failures"
                    );
                    if !sleep_or_cancel(cooldown, cancel).await {
                        return StopReason::Requested;
                    }
                    if let Some(reason) = self.stop_reason(cancel).await {
                        return reason;
                    }
                }

                let failure = match self.boost_symbol(symbol, cancel).await {
                    Attempt::Cancelled => return StopReason::Requested,
                    Attempt::Skipped => None,
                    Attempt::Booked(outcome) => outcome.failure_kind(),
                };
                previous = failure;

                if let Some(reason) = self.stop_reason(cancel).await {
                    return reason;
                }

                let settings = self.settings().await;
                let failures = self.stats.lock().await.consecutive_failures;
                let delay = self.with_random(|rng| {
                    self.backoff.delay_after(failure, &settings, failures, rng)
                });
                debug!(symbol = %symbol, delay = ?delay, "Waiting before next trade");
                if !sleep_or_cancel(delay, cancel).await {
                    return StopReason::Requested;
                }
            }
        }
    }

    /// One attempt on `symbol`: price, limits, sizing, balance, order.
    async fn boost_symbol(&self, symbol: &str, cancel: &CancellationToken) -> Attempt {
        let Some(exchange) = self.exchange.as_deref() else {
            return Attempt::Skipped;
        };

        let price = match self.lookup(cancel, exchange.get_price(symbol)).await {
            Lookup::Found(price) => price,
            Lookup::Missing(reason) => {
                warn!(symbol = %symbol, reason = %reason, "No price available, skipping");
                return self.skip().await;
            }
            Lookup::Cancelled => return Attempt::Cancelled,
        };

        let limits: SymbolLimits = match self.lookup(cancel, exchange.get_symbol_limits(symbol)).await {
            Lookup::Found(limits) => limits,
            Lookup::Missing(reason) => {
                warn!(symbol = %symbol, reason = %reason, "No symbol limits available, skipping");
                return self.skip().await;
            }
            Lookup::Cancelled => return Attempt::Cancelled,
        };

        let settings = self.settings().await;
        let sized = self.with_random(|rng| sizer::size_trade(symbol, price, &limits, &settings, rng));
        let intent = match sized {
            Ok(intent) => intent,
            Err(reason) => {
                debug!(symbol = %symbol, reason = %reason, "Trade size skipped");
                return self.skip().await;
            }
        };

        let currency = intent.funding_currency().to_string();
        let available = match self
            .lookup(cancel, exchange.get_available_balance(&currency))
            .await
        {
            Lookup::Found(amount) => Some(amount),
            Lookup::Missing(reason) => {
                debug!(currency = %currency, reason = %reason, "Balance lookup failed");
                None
            }
            Lookup::Cancelled => return Attempt::Cancelled,
        };

        let intent = match guard::check_balance(&intent, available, &limits) {
            Ok(intent) => intent,
            Err(rejection @ GuardRejection::BalanceUnavailable { .. }) => {
                warn!(symbol = %symbol, reason = %rejection, "Balance unavailable, skipping");
                return self.skip().await;
            }
            Err(rejection) => {
                debug!(symbol = %symbol, reason = %rejection, "Balance guard rejected trade");
                return self.skip().await;
            }
        };

        // Not raced against cancellation: the outcome must always be booked.
        self.submitting.store(true, Ordering::Release);
        let result = executor::submit(exchange, &intent, settings.order_type, self.order_timeout).await;

        let outcome = {
            let mut state = self.state.lock().await;
            let mut stats = self.stats.lock().await;
            executor::apply(result, &intent, &mut state, &mut stats)
        };
        self.submitting.store(false, Ordering::Release);
        Attempt::Booked(outcome)
    }

    /// Races a market-data call against cancellation and the lookup timeout.
    async fn lookup<T, F>(&self, cancel: &CancellationToken, call: F) -> Lookup<T>
    where
        F: Future<Output = exchanges::Result<Option<T>>>,
    {
        tokio::select! {
            _ = cancel.cancelled() => Lookup::Cancelled,
            result = tokio::time::timeout(self.market_data_timeout, call) => match result {
                Ok(Ok(Some(value))) => Lookup::Found(value),
                Ok(Ok(None)) => Lookup::Missing("not available".to_string()),
                Ok(Err(e)) => Lookup::Missing(e.to_string()),
                Err(_) => Lookup::Missing(format!("timed out after {:?}", self.market_data_timeout)),
            },
        }
    }

    async fn stop_reason(&self, cancel: &CancellationToken) -> Option<StopReason> {
        if cancel.is_cancelled() {
            return Some(StopReason::Requested);
        }

        {
            let state = self.state.lock().await;
            if state.should_stop {
                return Some(StopReason::Requested);
            }
            if state.target_reached() {
                return Some(StopReason::TargetReached);
            }
        }

        if !self.settings().await.enabled {
            return Some(StopReason::Disabled);
        }
        None
    }

    async fn settings(&self) -> Settings {
        match &self.cache {
            Some(cache) => cache.lock().await.settings().clone(),
            None => Settings::default(),
        }
    }

    async fn skip(&self) -> Attempt {
        self.stats.lock().await.skipped_attempts += 1;
        Attempt::Skipped
    }

    fn with_random<R>(&self, f: impl FnOnce(&mut dyn RandomSource) -> R) -> R {
        let mut random = self.random.lock().unwrap_or_else(|e| e.into_inner());
        f(random.as_mut())
    }
}

/// Sleeps unless cancelled first. Returns false on cancellation.
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
