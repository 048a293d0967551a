//! Market registry.
//!
//! An [`Exchange`] maps market symbols to one [`OrderBook`] each. Every
//! operation on a market holds that book's mutex for its whole duration, so
//! mutations on one market are serialized while different markets proceed
//! in parallel. Lookups go through a `DashMap`; the map guard is dropped
//! before the book lock is taken.
//!
//! Settlement runs after the book lock is released and cannot undo a match.
//!
//! ```
//! use exchange_core::exchange::{Exchange, OrderAck};
//! use exchange_core::types::OrderRequest;
//!
//! let exchange = Exchange::new();
//! exchange.add_market("ETH").unwrap();
//!
//! let ask: OrderRequest =
//!     serde_json::from_str(r#"{"type":"limit","user_id":1,"side":"ask","size":10.0,"price":100.0}"#).unwrap();
//! let buy: OrderRequest =
//!     serde_json::from_str(r#"{"type":"market","user_id":2,"side":"bid","size":4.0}"#).unwrap();
//!
//! assert!(matches!(exchange.submit("ETH", ask), Ok(OrderAck::Placed { order_id: 1 })));
//! let Ok(OrderAck::Filled(fill)) = exchange.submit("ETH", buy) else { panic!("expected fill") };
//! assert_eq!(fill.filled(), 400_000_000);
//! ```

mod settlement;

pub use settlement::{LoggingSettlement, Settlement, SettlementError, SettlementInstruction};

use std::borrow::Borrow;
use std::fmt;
use std::sync::{Arc, Mutex};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{info, warn};

use crate::config::{ExchangeConfig, DEFAULT_ORDER_CAPACITY};
use crate::error::{EngineError, Result};
use crate::orderbook::{BookSnapshot, OrderBook, DEFAULT_TRADE_HISTORY_LIMIT};
use crate::types::{LimitOrderRequest, MarketFill, MarketOrderRequest, Order, OrderRequest, Trade};

/// Market symbol, e.g. `"ETH"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct Market(String);

impl Market {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Market {
    fn from(symbol: &str) -> Self {
        Market(symbol.to_string())
    }
}

impl From<String> for Market {
    fn from(symbol: String) -> Self {
        Market(symbol)
    }
}

impl Borrow<str> for Market {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a routed [`OrderRequest`]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OrderAck {
    /// Limit order is resting
    Placed { order_id: u64 },
    /// Market order executed in full
    Filled(MarketFill),
    /// Resting order removed
    Cancelled { order_id: u64 },
}

/// Registry of per-market order books
pub struct Exchange {
    books: DashMap<Market, Arc<Mutex<OrderBook>>>,
    order_capacity: usize,
    trade_history_limit: usize,
    settlement: Arc<dyn Settlement>,
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("markets", &self.markets())
            .field("order_capacity", &self.order_capacity)
            .field("trade_history_limit", &self.trade_history_limit)
            .finish_non_exhaustive()
    }
}

impl Exchange {
    /// Create an exchange with no markets and logging-only settlement
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
            order_capacity: DEFAULT_ORDER_CAPACITY,
            trade_history_limit: DEFAULT_TRADE_HISTORY_LIMIT,
            settlement: Arc::new(LoggingSettlement),
        }
    }

    /// Create an exchange and register every configured market
    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        let exchange = Self {
            order_capacity: config.order_capacity,
            trade_history_limit: config.trade_history_limit,
            ..Self::new()
        };
        for market in &config.markets {
            exchange.add_market(market.as_str())?;
        }
        Ok(exchange)
    }

    /// Replace the settlement collaborator
    pub fn with_settlement(mut self, settlement: Arc<dyn Settlement>) -> Self {
        self.settlement = settlement;
        self
    }

    /// Register a new market with an empty book
    ///
    /// # Errors
    ///
    /// `MarketExists` if the symbol is already registered
    pub fn add_market(&self, market: impl Into<Market>) -> Result<()> {
        let market = market.into();
        match self.books.entry(market) {
            Entry::Occupied(entry) => Err(EngineError::MarketExists(entry.key().to_string())),
            Entry::Vacant(entry) => {
                let book = OrderBook::with_capacity(entry.key().as_str(), self.order_capacity)
                    .with_trade_history_limit(self.trade_history_limit);
                info!(
                    market = %entry.key(),
                    order_capacity = self.order_capacity,
                    "registered market"
                );
                entry.insert(Arc::new(Mutex::new(book)));
                Ok(())
            }
        }
    }

    /// Registered market symbols, sorted
    pub fn markets(&self) -> Vec<Market> {
        let mut markets: Vec<Market> = self.books.iter().map(|e| e.key().clone()).collect();
        markets.sort();
        markets
    }

    /// Route a typed request to a market's book
    pub fn submit(&self, market: &str, request: OrderRequest) -> Result<OrderAck> {
        match request {
            OrderRequest::Limit(limit) => self
                .place_limit_order(market, &limit)
                .map(|order_id| OrderAck::Placed { order_id }),
            OrderRequest::Market(order) => {
                self.place_market_order(market, &order).map(OrderAck::Filled)
            }
            OrderRequest::Cancel(cancel) => self
                .cancel_order(market, cancel.order_id)
                .map(|order| OrderAck::Cancelled { order_id: order.id }),
        }
    }

    /// Validate and rest a limit order
    pub fn place_limit_order(&self, market: &str, request: &LimitOrderRequest) -> Result<u64> {
        let order = request.validate()?;
        self.with_book(market, |book| book.place_limit_order(order.price, order))
    }

    /// Validate and execute a market order, then settle its matches
    pub fn place_market_order(
        &self,
        market: &str,
        request: &MarketOrderRequest,
    ) -> Result<MarketFill> {
        let order = request.validate()?;
        let fill = self.with_book(market, |book| book.place_market_order(order))?;
        self.settle(market, &fill);
        Ok(fill)
    }

    /// Cancel a resting order on either side
    pub fn cancel_order(&self, market: &str, order_id: u64) -> Result<Order> {
        self.with_book(market, |book| book.cancel_order(order_id))
    }

    pub fn snapshot(&self, market: &str) -> Result<BookSnapshot> {
        self.with_book(market, |book| Ok(book.snapshot()))
    }

    pub fn best_bid(&self, market: &str) -> Result<u64> {
        self.with_book(market, |book| book.best_bid())
    }

    pub fn best_ask(&self, market: &str) -> Result<u64> {
        self.with_book(market, |book| book.best_ask())
    }

    /// Up to `limit` most recent trades, newest first
    pub fn trades(&self, market: &str, limit: usize) -> Result<Vec<Trade>> {
        self.with_book(market, |book| Ok(book.recent_trades(limit)))
    }

    pub fn orders_for_user(&self, market: &str, user_id: u64) -> Result<Vec<Order>> {
        self.with_book(market, |book| {
            Ok(book.orders_for_user(user_id).into_iter().cloned().collect())
        })
    }

    pub fn state_root_hex(&self, market: &str) -> Result<String> {
        self.with_book(market, |book| book.state_root_hex())
    }

    /// Run `f` with the market's book locked
    fn with_book<T>(&self, market: &str, f: impl FnOnce(&mut OrderBook) -> Result<T>) -> Result<T> {
        let book = self
            .books
            .get(market)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::MarketNotFound(market.to_string()))?;
        let mut guard = book
            .lock()
            .map_err(|_| EngineError::LockPoisoned(market.to_string()))?;
        f(&mut *guard)
    }

    fn settle(&self, market: &str, fill: &MarketFill) {
        let market = Market::from(market);
        for m in &fill.matches {
            let instruction = SettlementInstruction::from_match(m);
            if let Err(err) = self.settlement.settle(&market, &instruction) {
                warn!(
                    market = %market,
                    bid_order_id = m.bid_order_id,
                    ask_order_id = m.ask_order_id,
                    error = %err,
                    "settlement failed"
                );
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CancelRequest, Side};
    use std::thread;

    /// Records every instruction; optionally rejects all of them
    #[derive(Default)]
    struct RecordingSettlement {
        seen: Mutex<Vec<SettlementInstruction>>,
        fail: bool,
    }

    impl Settlement for RecordingSettlement {
        fn settle(
            &self,
            _market: &Market,
            instruction: &SettlementInstruction,
        ) -> std::result::Result<(), SettlementError> {
            self.seen.lock().unwrap().push(*instruction);
            if self.fail {
                Err(SettlementError("transfer rejected".into()))
            } else {
                Ok(())
            }
        }
    }

    fn limit(user_id: u64, side: Side, size: f64, price: f64) -> LimitOrderRequest {
        LimitOrderRequest {
            user_id,
            side,
            size,
            price,
        }
    }

    fn market(user_id: u64, side: Side, size: f64) -> MarketOrderRequest {
        MarketOrderRequest {
            user_id,
            side,
            size,
        }
    }

    #[test]
    fn test_add_market_twice() {
        let exchange = Exchange::new();
        exchange.add_market("ETH").unwrap();

        assert_eq!(
            exchange.add_market("ETH"),
            Err(EngineError::MarketExists("ETH".into()))
        );
        assert_eq!(exchange.markets(), vec![Market::from("ETH")]);
    }

    #[test]
    fn test_unknown_market() {
        let exchange = Exchange::new();
        assert_eq!(
            exchange.best_bid("DOGE"),
            Err(EngineError::MarketNotFound("DOGE".into()))
        );
        assert!(matches!(
            exchange.submit("DOGE", OrderRequest::Cancel(CancelRequest { order_id: 1 })),
            Err(EngineError::MarketNotFound(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = ExchangeConfig {
            markets: vec!["BTC".into(), "ETH".into()],
            order_capacity: 32,
            trade_history_limit: 1,
        };
        let exchange = Exchange::from_config(&config).unwrap();

        assert_eq!(exchange.markets(), vec![Market::from("BTC"), Market::from("ETH")]);

        exchange.place_limit_order("BTC", &limit(1, Side::Sell, 2.0, 10.0)).unwrap();
        exchange.place_market_order("BTC", &market(2, Side::Buy, 1.0)).unwrap();
        exchange.place_market_order("BTC", &market(2, Side::Buy, 1.0)).unwrap();
        assert_eq!(exchange.trades("BTC", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_validation_happens_before_lock() {
        let exchange = Exchange::new();
        exchange.add_market("ETH").unwrap();

        assert!(matches!(
            exchange.place_limit_order("ETH", &limit(1, Side::Buy, -1.0, 100.0)),
            Err(EngineError::InvalidInput { field: "size", .. })
        ));
        assert_eq!(exchange.snapshot("ETH").unwrap().bids.len(), 0);
    }

    #[test]
    fn test_market_order_settles_each_match() {
        let settlement = Arc::new(RecordingSettlement::default());
        let exchange = Exchange::new().with_settlement(settlement.clone());
        exchange.add_market("ETH").unwrap();

        exchange.place_limit_order("ETH", &limit(1, Side::Sell, 5.0, 100.0)).unwrap();
        exchange.place_limit_order("ETH", &limit(2, Side::Sell, 5.0, 101.0)).unwrap();
        exchange.place_market_order("ETH", &market(9, Side::Buy, 8.0)).unwrap();

        let seen = settlement.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].payer_user_id, 9);
        assert_eq!(seen[0].payee_user_id, 1);
        assert_eq!(seen[0].amount, 500_000_000);
        assert_eq!(seen[1].payee_user_id, 2);
        assert_eq!(seen[1].amount, 300_000_000);
    }

    #[test]
    fn test_failed_settlement_keeps_match() {
        let settlement = Arc::new(RecordingSettlement {
            fail: true,
            ..Default::default()
        });
        let exchange = Exchange::new().with_settlement(settlement.clone());
        exchange.add_market("ETH").unwrap();

        exchange.place_limit_order("ETH", &limit(1, Side::Buy, 5.0, 100.0)).unwrap();
        let fill = exchange.place_market_order("ETH", &market(9, Side::Sell, 5.0)).unwrap();

        assert_eq!(fill.filled(), 500_000_000);
        assert_eq!(settlement.seen.lock().unwrap()[0].payer_user_id, 1);
        assert_eq!(exchange.best_bid("ETH"), Err(EngineError::NoLiquidity(Side::Buy)));
        assert_eq!(exchange.trades("ETH", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_submit_routes_every_request() {
        let exchange = Exchange::new();
        exchange.add_market("ETH").unwrap();

        let ack = exchange
            .submit("ETH", OrderRequest::Limit(limit(1, Side::Buy, 1.0, 99.5)))
            .unwrap();
        assert_eq!(ack, OrderAck::Placed { order_id: 1 });
        assert_eq!(exchange.orders_for_user("ETH", 1).unwrap().len(), 1);

        let ack = exchange
            .submit("ETH", OrderRequest::Cancel(CancelRequest { order_id: 1 }))
            .unwrap();
        assert_eq!(ack, OrderAck::Cancelled { order_id: 1 });
        assert!(exchange.orders_for_user("ETH", 1).unwrap().is_empty());

        assert_eq!(
            exchange.submit("ETH", OrderRequest::Cancel(CancelRequest { order_id: 1 })),
            Err(EngineError::NotFound(1))
        );
    }

    #[test]
    fn test_ack_json() {
        let json = serde_json::to_value(OrderAck::Placed { order_id: 4 }).unwrap();
        assert_eq!(json["status"], "placed");
        assert_eq!(json["order_id"], 4);
    }

    #[test]
    fn test_markets_are_independent_across_threads() {
        let exchange = Exchange::new();
        let symbols = ["ETH", "BTC", "SOL", "ARB"];
        for symbol in symbols {
            exchange.add_market(symbol).unwrap();
        }

        thread::scope(|s| {
            for symbol in symbols {
                let exchange = &exchange;
                s.spawn(move || {
                    for i in 0..200u64 {
                        exchange
                            .place_limit_order(symbol, &limit(i, Side::Sell, 1.0, 100.0))
                            .unwrap();
                    }
                    for i in 0..100u64 {
                        exchange
                            .place_market_order(symbol, &market(1_000 + i, Side::Buy, 1.0))
                            .unwrap();
                    }
                });
            }
        });

        for symbol in symbols {
            let snapshot = exchange.snapshot(symbol).unwrap();
            assert_eq!(snapshot.total_ask_volume, 100 * 100_000_000);
            assert_eq!(snapshot.asks[0].orders.len(), 100);
            assert_eq!(snapshot.asks[0].orders[0].id, 101);
        }
    }

    #[test]
    fn test_same_market_is_serialized() {
        let exchange = Exchange::new();
        exchange.add_market("ETH").unwrap();

        thread::scope(|s| {
            for t in 0..4u64 {
                let exchange = &exchange;
                s.spawn(move || {
                    for i in 0..250u64 {
                        exchange
                            .place_limit_order("ETH", &limit(t * 1_000 + i, Side::Buy, 1.0, 100.0))
                            .unwrap();
                    }
                });
            }
        });

        let snapshot = exchange.snapshot("ETH").unwrap();
        assert_eq!(snapshot.bids[0].orders.len(), 1_000);
        assert_eq!(snapshot.total_bid_volume, 1_000 * 100_000_000);
        let mut ids: Vec<u64> = snapshot.bids[0].orders.iter().map(|o| o.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 1_000);
    }
}
