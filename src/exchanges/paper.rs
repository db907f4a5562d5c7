//! In-memory simulated exchange for paper trading.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::PaperConfig;
use crate::domain::{OrderHandle, OrderRequest, OrderSide, OrderStatus, OrderType, SymbolLimits, split_symbol};
use crate::exchanges::utils::symbol_to_market_id;
use crate::exchanges::{Exchange, ExchangeError, MarketData, Portfolio, Result, TradingFacade};

const EXCHANGE_NAME: &str = "paper";

/// Price and trading rules of one simulated market.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperMarket {
    pub price: Decimal,
    pub limits: SymbolLimits,
}

struct PaperState {
    balances: HashMap<String, Decimal>,
    markets: HashMap<String, PaperMarket>,
}

/// Simulated exchange.
///
/// Market orders fill immediately at the current price and move balances.
/// Limit orders are accepted and stay open.
pub struct PaperExchange {
    state: Mutex<PaperState>,
    fee_rate: Decimal,
    active: AtomicBool,
    next_order_id: AtomicU64,
}

impl PaperExchange {
    /// Creates an empty, active paper exchange.
    pub fn new(fee_rate: Decimal) -> Self {
        Self::with_state(fee_rate, HashMap::new(), HashMap::new())
    }

    /// Creates a paper exchange from the `paper` config section.
    pub fn from_config(config: &PaperConfig) -> Self {
        let markets = config
            .markets
            .iter()
            .map(|(symbol, m)| {
                (
                    symbol.clone(),
                    PaperMarket {
                        price: m.price,
                        limits: SymbolLimits {
                            min_quantity: m.min_quantity,
                            min_cost: m.min_cost,
                            amount_precision: m.amount_precision,
                        },
                    },
                )
            })
            .collect();

        let exchange = Self::with_state(
            config.fee_rate.unwrap_or_default(),
            config.balances.clone(),
            markets,
        );
        exchange.set_active(config.enabled);
        exchange
    }

    fn with_state(
        fee_rate: Decimal,
        balances: HashMap<String, Decimal>,
        markets: HashMap<String, PaperMarket>,
    ) -> Self {
        Self {
            state: Mutex::new(PaperState { balances, markets }),
            fee_rate,
            active: AtomicBool::new(true),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Enables or disables simulated trading.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Adds or replaces a market.
    pub async fn set_market(&self, symbol: &str, market: PaperMarket) {
        self.state.lock().await.markets.insert(symbol.to_string(), market);
    }

    /// Updates the price of an existing market.
    pub async fn set_price(&self, symbol: &str, price: Decimal) -> Result<()> {
        let mut state = self.state.lock().await;
        let market = state
            .markets
            .get_mut(symbol)
            .ok_or_else(|| ExchangeError::PairNotSupported(symbol.to_string()))?;
        market.price = price;
        Ok(())
    }

    /// Sets the available balance of a currency.
    pub async fn set_balance(&self, currency: &str, amount: Decimal) {
        self.state.lock().await.balances.insert(currency.to_string(), amount);
    }

    fn next_id(&self, symbol: &str) -> String {
        let n = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}-{}", EXCHANGE_NAME, symbol_to_market_id(symbol), n)
    }
}

#[async_trait]
impl TradingFacade for PaperExchange {
    fn is_trading_enabled(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn create_order(&self, request: OrderRequest) -> Result<Option<OrderHandle>> {
        if !self.is_trading_enabled() {
            return Err(ExchangeError::Connection("paper trading is not active".to_string()));
        }

        let (base, quote) = split_symbol(&request.symbol)
            .ok_or_else(|| ExchangeError::PairNotSupported(request.symbol.clone()))?;

        let mut state = self.state.lock().await;
        let market = state
            .markets
            .get(&request.symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::PairNotSupported(request.symbol.clone()))?;

        let notional = request.quantity * request.price;
        if request.quantity <= Decimal::ZERO
            || request.quantity < market.limits.min_quantity_or_zero()
            || notional < market.limits.min_cost_or_zero()
        {
            return Err(ExchangeError::OrderTooSmall(format!(
                "{} {} @ {}",
                request.quantity, request.symbol, request.price
            )));
        }

        let id = self.next_id(&request.symbol);

        if request.order_type == OrderType::Limit {
            debug!(order_id = %id, symbol = %request.symbol, "paper limit order resting");
            return Ok(Some(OrderHandle {
                id,
                symbol: request.symbol,
                side: request.side,
                status: OrderStatus::Open,
                filled_quantity: Decimal::ZERO,
                filled_price: Decimal::ZERO,
                created_at: Utc::now(),
            }));
        }

        let fill_price = market.price;
        let cost = request.quantity * fill_price;
        let keep = Decimal::ONE - self.fee_rate;

        let (spend_currency, spend, receive_currency, receive) = match request.side {
            OrderSide::Buy => (quote, cost, base, request.quantity * keep),
            OrderSide::Sell => (base, request.quantity, quote, cost * keep),
        };

        let available = state.balances.get(spend_currency).copied().unwrap_or_default();
        if available < spend {
            return Err(ExchangeError::InsufficientFunds(format!(
                "{} {} available, {} required",
                available, spend_currency, spend
            )));
        }

        state
            .balances
            .insert(spend_currency.to_string(), available - spend);
        *state
            .balances
            .entry(receive_currency.to_string())
            .or_insert(Decimal::ZERO) += receive;

        debug!(
            order_id = %id,
            symbol = %request.symbol,
            side = %request.side,
            quantity = %request.quantity,
            price = %fill_price,
            "paper market order filled"
        );

        Ok(Some(OrderHandle {
            id,
            symbol: request.symbol,
            side: request.side,
            status: OrderStatus::Filled,
            filled_quantity: request.quantity,
            filled_price: fill_price,
            created_at: Utc::now(),
        }))
    }
}

#[async_trait]
impl MarketData for PaperExchange {
    async fn get_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        Ok(self.state.lock().await.markets.get(symbol).map(|m| m.price))
    }

    async fn get_symbol_limits(&self, symbol: &str) -> Result<Option<SymbolLimits>> {
        Ok(self
            .state
            .lock()
            .await
            .markets
            .get(symbol)
            .map(|m| m.limits.clone()))
    }
}

#[async_trait]
impl Portfolio for PaperExchange {
    async fn get_available_balance(&self, currency: &str) -> Result<Option<Decimal>> {
        Ok(Some(
            self.state
                .lock()
                .await
                .balances
                .get(currency)
                .copied()
                .unwrap_or_default(),
        ))
    }
}

impl Exchange for PaperExchange {
    fn name(&self) -> &str {
        EXCHANGE_NAME
    }
}
