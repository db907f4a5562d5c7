//! Order Executor: submits intents and books their outcome.
//!
//! [`apply`] is the only place that advances the current volume.

use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::state::BoosterState;
use super::stats::Stats;
use crate::domain::{FillOutcome, OrderHandle, OrderType, TradeIntent};
use crate::exchanges::{ExchangeError, FailureKind, Result, TradingFacade};

/// How an order attempt was booked.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Filled or partially filled; the filled notional was credited.
    Executed { order_id: String, notional: Decimal },
    /// Pending or open; the intended notional was credited.
    Provisional { order_id: String, notional: Decimal },
    /// Nothing credited.
    Failed { kind: FailureKind, reason: String },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ExecutionOutcome::Failed { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Sends the intent to the trading facade, bounded by `timeout`.
///
/// A submission that does not finish in time is reported as
/// [`ExchangeError::Timeout`].
pub async fn submit<F: TradingFacade + ?Sized>(
    facade: &F,
    intent: &TradeIntent,
    order_type: OrderType,
    timeout: Duration,
) -> Result<Option<OrderHandle>> {
    let request = intent.to_request(order_type);
    debug!(
        symbol = %request.symbol,
        side = %request.side,
        order_type = %request.order_type,
        quantity = %request.quantity,
        price = %request.price,
        "Submitting order"
    );

    match tokio::time::timeout(timeout, facade.create_order(request)).await {
        Ok(result) => result,
        Err(_) => Err(ExchangeError::Timeout(format!(
            "order submission exceeded {:?}",
            timeout
        ))),
    }
}

/// Books a submission result into the state and statistics.
pub fn apply(
    result: Result<Option<OrderHandle>>,
    intent: &TradeIntent,
    state: &mut BoosterState,
    stats: &mut Stats,
) -> ExecutionOutcome {
    let handle = match result {
        Ok(Some(handle)) => handle,
        Ok(None) => {
            stats.record_failure();
            warn!(symbol = %intent.symbol, side = %intent.side, "Order was not created");
            return ExecutionOutcome::Failed {
                kind: FailureKind::Rejected,
                reason: "trading facade returned no order".to_string(),
            };
        }
        Err(e) => return book_error(e, intent, stats),
    };

    stats.orders_placed += 1;

    let outcome = match handle.status.outcome() {
        FillOutcome::Executed => {
            let filled = handle.filled_notional();
            let notional = if filled > Decimal::ZERO {
                filled
            } else {
                intent.notional()
            };
            ExecutionOutcome::Executed {
                order_id: handle.id.clone(),
                notional,
            }
        }
        FillOutcome::Provisional => ExecutionOutcome::Provisional {
            order_id: handle.id.clone(),
            notional: intent.notional(),
        },
        FillOutcome::Failed => {
            stats.record_failure();
            warn!(
                symbol = %intent.symbol,
                order_id = %handle.id,
                status = %handle.status,
                "Order did not trade"
            );
            return ExecutionOutcome::Failed {
                kind: FailureKind::Rejected,
                reason: format!("order {} {}", handle.id, handle.status),
            };
        }
    };

    if let ExecutionOutcome::Executed { notional, .. } | ExecutionOutcome::Provisional { notional, .. } =
        &outcome
    {
        state.add_volume(*notional);
        stats.record_success();
    }

    info!(
        symbol = %intent.symbol,
        side = %intent.side,
        quantity = %intent.quantity,
        price = %intent.price,
        status = %handle.status,
        current_volume = %state.current_volume.round_dp(2),
        target_volume = %state.target_volume.round_dp(2),
        "Volume boost order placed"
    );

    outcome
}

fn book_error(e: ExchangeError, intent: &TradeIntent, stats: &mut Stats) -> ExecutionOutcome {
    let kind = e.failure_kind();
    if kind.counts_as_failure() {
        stats.record_failure();
    }

    match kind {
        FailureKind::SizeTooSmall => {
            debug!(symbol = %intent.symbol, error = %e, "Trade amount too small")
        }
        FailureKind::Unknown => error!(
            symbol = %intent.symbol,
            side = %intent.side,
            quantity = %intent.quantity,
            price = %intent.price,
            consecutive_failures = stats.consecutive_failures,
            error = %e,
            "Error executing volume boost trade"
        ),
        _ => warn!(symbol = %intent.symbol, kind = %kind, error = %e, "Order failed"),
    }

    ExecutionOutcome::Failed {
        kind,
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderRequest, OrderSide, OrderStatus};
    use async_trait::async_trait;
    use chrono::Utc;

    fn intent() -> TradeIntent {
        TradeIntent {
            symbol: "BTC/USDT".to_string(),
            side: OrderSide::Buy,
            quote_amount: Decimal::from(30),
            quantity: Decimal::new(3, 2),
            price: Decimal::from(1000),
        }
    }

    fn handle(status: OrderStatus, filled_quantity: Decimal) -> OrderHandle {
        OrderHandle {
            id: "42".to_string(),
            symbol: "BTC/USDT".to_string(),
            side: OrderSide::Buy,
            status,
            filled_quantity,
            filled_price: Decimal::from(1000),
            created_at: Utc::now(),
        }
    }

    fn books(result: Result<Option<OrderHandle>>) -> (ExecutionOutcome, BoosterState, Stats) {
        let mut state = BoosterState::new(Decimal::from(1000));
        let mut stats = Stats {
            consecutive_failures: 2,
            ..Stats::default()
        };
        let outcome = apply(result, &intent(), &mut state, &mut stats);
        (outcome, state, stats)
    }

    #[test]
    fn test_filled_credits_filled_notional() {
        let (outcome, state, stats) = books(Ok(Some(handle(OrderStatus::Filled, Decimal::new(2, 2)))));

        assert!(outcome.is_success());
        assert_eq!(state.current_volume, Decimal::from(20));
        assert_eq!(stats.orders_placed, 1);
        assert_eq!(stats.successful_orders, 1);
        assert_eq!(stats.consecutive_failures, 0);
    }

    #[test]
    fn test_filled_without_fill_data_uses_intent() {
        let (_, state, _) = books(Ok(Some(handle(OrderStatus::PartiallyFilled, Decimal::ZERO))));
        assert_eq!(state.current_volume, Decimal::from(30));
    }

    #[test]
    fn test_open_order_is_provisional_success() {
        let (outcome, state, stats) = books(Ok(Some(handle(OrderStatus::Open, Decimal::ZERO))));

        assert!(matches!(outcome, ExecutionOutcome::Provisional { .. }));
        assert_eq!(state.current_volume, Decimal::from(30));
        assert_eq!(stats.successful_orders, 1);
    }

    #[test]
    fn test_canceled_order_is_failure() {
        let (outcome, state, stats) = books(Ok(Some(handle(OrderStatus::Canceled, Decimal::ZERO))));

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Rejected));
        assert_eq!(state.current_volume, Decimal::ZERO);
        assert_eq!(stats.orders_placed, 1);
        assert_eq!(stats.failed_orders, 1);
        assert_eq!(stats.consecutive_failures, 3);
    }

    #[test]
    fn test_no_order_is_failure() {
        let (outcome, _, stats) = books(Ok(None));

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Rejected));
        assert_eq!(stats.orders_placed, 0);
        assert_eq!(stats.failed_orders, 1);
    }

    #[test]
    fn test_too_small_is_not_counted() {
        let (outcome, _, stats) = books(Err(ExchangeError::OrderTooSmall("dust".to_string())));

        assert_eq!(outcome.failure_kind(), Some(FailureKind::SizeTooSmall));
        assert_eq!(stats.failed_orders, 0);
        assert_eq!(stats.consecutive_failures, 2);
    }

    #[test]
    fn test_rate_limit_is_counted() {
        let (outcome, _, stats) = books(Err(ExchangeError::RateLimited("slow down".to_string())));

        assert_eq!(outcome.failure_kind(), Some(FailureKind::RateLimited));
        assert_eq!(stats.failed_orders, 1);
        assert!(stats.last_failure_at.is_some());
    }

    struct SlowFacade;

    #[async_trait]
    impl TradingFacade for SlowFacade {
        fn is_trading_enabled(&self) -> bool {
            true
        }

        async fn create_order(&self, _request: OrderRequest) -> Result<Option<OrderHandle>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_submit_timeout_is_unknown_failure() {
        let result = submit(
            &SlowFacade,
            &intent(),
            OrderType::Market,
            Duration::from_millis(20),
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ExchangeError::Timeout(_)));
        assert_eq!(err.failure_kind(), FailureKind::Unknown);
    }
}
