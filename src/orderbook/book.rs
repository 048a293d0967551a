//! Single-market limit order book.
//!
//! ## Architecture
//!
//! The book uses a hybrid data structure:
//!
//! - **Slab**: Pre-allocated storage for O(1) order operations
//! - **BTreeMap**: Price levels kept in best-first order, so best bid/ask and
//!   level iteration never re-sort
//! - **HashMap**: Order ID to slab key mapping for O(1) cancel and lookup
//!
//! ## Price Ordering
//!
//! - **Bids** (buy orders): Sorted high-to-low (best bid = highest price)
//! - **Asks** (sell orders): Sorted low-to-high (best ask = lowest price)
//!
//! ## Invariants
//!
//! - Every resting order is in exactly one level, on its own side, and in
//!   the id index
//! - No empty level is ever left in either side's map
//! - A level's volume equals the sum of its orders' remaining sizes
//!
//! Limit orders only rest; they are never matched on admission. Matching is
//! driven by market orders, see [`OrderBook::place_market_order`].
//!
//! ## Example
//!
//! ```
//! use exchange_core::orderbook::OrderBook;
//! use exchange_core::types::{Order, Side};
//!
//! let mut book = OrderBook::with_capacity("ETH", 10_000);
//!
//! book.place_limit_order(5_000_000_000_000, Order::limit(100, Side::Buy, 0, 100_000_000)).unwrap();
//! book.place_limit_order(5_100_000_000_000, Order::limit(101, Side::Sell, 0, 100_000_000)).unwrap();
//!
//! assert_eq!(book.best_bid(), Ok(5_000_000_000_000));
//! assert_eq!(book.best_ask(), Ok(5_100_000_000_000));
//! assert_eq!(book.spread(), Some(100_000_000_000));
//! ```

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, VecDeque};

use slab::Slab;
use tracing::{debug, trace};

use crate::error::{EngineError, Result};
use crate::orderbook::{Limit, OrderNode};
use crate::types::{Order, OrderType, Side, Trade};
use crate::utils::monotonic_nanos;

/// Default number of trades retained per book
pub const DEFAULT_TRADE_HISTORY_LIMIT: usize = 10_000;

/// Limit order book for one market
#[derive(Debug)]
pub struct OrderBook {
    /// Market symbol this book serves
    symbol: String,

    /// Pre-allocated order storage
    /// Key: slab index, Value: OrderNode
    pub(super) orders: Slab<OrderNode>,

    /// Bid price levels (sorted high to low)
    /// Key: Reverse(price) for descending order
    pub(super) bids: BTreeMap<Reverse<u64>, Limit>,

    /// Ask price levels (sorted low to high)
    pub(super) asks: BTreeMap<u64, Limit>,

    /// Order ID to slab key mapping
    pub(super) order_index: HashMap<u64, usize>,

    /// Next order ID (for auto-assignment)
    pub(super) next_order_id: u64,

    /// Next trade ID
    pub(super) next_trade_id: u64,

    /// Executed trades, oldest first
    pub(super) trades: VecDeque<Trade>,

    /// Maximum number of trades retained
    pub(super) trade_history_limit: usize,
}

impl OrderBook {
    /// Create a new empty book
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_capacity(symbol, 0)
    }

    /// Create a book with pre-allocated order capacity
    ///
    /// ```
    /// use exchange_core::orderbook::OrderBook;
    ///
    /// let book = OrderBook::with_capacity("BTC", 100_000);
    /// assert!(book.capacity() >= 100_000);
    /// assert_eq!(book.symbol(), "BTC");
    /// ```
    pub fn with_capacity(symbol: impl Into<String>, order_capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            orders: Slab::with_capacity(order_capacity),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: HashMap::with_capacity(order_capacity),
            next_order_id: 1,
            next_trade_id: 1,
            trades: VecDeque::new(),
            trade_history_limit: DEFAULT_TRADE_HISTORY_LIMIT,
        }
    }

    /// Set how many trades the book retains
    pub fn with_trade_history_limit(mut self, limit: usize) -> Self {
        self.trade_history_limit = limit;
        while self.trades.len() > limit {
            self.trades.pop_front();
        }
        self
    }

    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    /// Get the current capacity (pre-allocated slots)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.orders.capacity()
    }

    /// Get the total number of resting orders
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the number of bid price levels
    #[inline]
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Get the number of ask price levels
    #[inline]
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Rest a limit order at `price` on its side
    ///
    /// The order is never matched against the opposite side, even when the
    /// price crosses it. An id of 0 is replaced by the book's next id, and a
    /// timestamp of 0 by the monotonic clock.
    ///
    /// # Returns
    ///
    /// The id of the resting order.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a zero price or size, or for an id the book has
    /// already handed out.
    ///
    /// ```
    /// use exchange_core::orderbook::OrderBook;
    /// use exchange_core::types::{Order, Side};
    ///
    /// let mut book = OrderBook::new("ETH");
    /// let id = book.place_limit_order(10_000_000_000, Order::limit(7, Side::Sell, 0, 500_000_000)).unwrap();
    ///
    /// assert_eq!(id, 1);
    /// assert_eq!(book.total_ask_volume(), 500_000_000);
    /// ```
    pub fn place_limit_order(&mut self, price: u64, mut order: Order) -> Result<u64> {
        if price == 0 {
            return Err(EngineError::invalid("price", "must be positive"));
        }
        if order.remaining == 0 {
            return Err(EngineError::invalid("size", "must be positive"));
        }

        order.price = price;
        order.order_type_raw = OrderType::Limit.to_u8();
        self.stamp(&mut order)?;

        let order_id = order.id;
        let side = order.side();
        let key = self.orders.insert(OrderNode::new(order));

        let added = match side {
            Side::Buy => self
                .bids
                .entry(Reverse(price))
                .or_insert_with(|| {
                    debug!(price, side = %side, "created price level");
                    Limit::new(price, side)
                })
                .add(key, &mut self.orders),
            Side::Sell => self
                .asks
                .entry(price)
                .or_insert_with(|| {
                    debug!(price, side = %side, "created price level");
                    Limit::new(price, side)
                })
                .add(key, &mut self.orders),
        };
        added?;

        self.order_index.insert(order_id, key);
        trace!(order_id, price, side = %side, "limit order resting");

        Ok(order_id)
    }

    /// Cancel a resting order by id
    ///
    /// # Errors
    ///
    /// `NotFound` if no order with this id rests on the book, including a
    /// second cancel of the same order.
    ///
    /// ```
    /// use exchange_core::error::EngineError;
    /// use exchange_core::orderbook::OrderBook;
    /// use exchange_core::types::{Order, Side};
    ///
    /// let mut book = OrderBook::new("ETH");
    /// let id = book.place_limit_order(10_000_000_000, Order::limit(1, Side::Buy, 0, 100_000_000)).unwrap();
    ///
    /// assert!(book.cancel_order(id).is_ok());
    /// assert_eq!(book.cancel_order(id), Err(EngineError::NotFound(id)));
    /// ```
    pub fn cancel_order(&mut self, order_id: u64) -> Result<Order> {
        let key = *self
            .order_index
            .get(&order_id)
            .ok_or(EngineError::NotFound(order_id))?;
        let node = self.orders.get(key).ok_or(EngineError::NotFound(order_id))?;
        let side = node.side();
        let price = node.level.ok_or(EngineError::NotFound(order_id))?;

        match side {
            Side::Buy => {
                let level = self
                    .bids
                    .get_mut(&Reverse(price))
                    .ok_or(EngineError::NotFound(order_id))?;
                level.remove(key, &mut self.orders)?;
                if level.is_empty() {
                    self.bids.remove(&Reverse(price));
                    debug!(price, side = %side, "removed empty price level");
                }
            }
            Side::Sell => {
                let level = self
                    .asks
                    .get_mut(&price)
                    .ok_or(EngineError::NotFound(order_id))?;
                level.remove(key, &mut self.orders)?;
                if level.is_empty() {
                    self.asks.remove(&price);
                    debug!(price, side = %side, "removed empty price level");
                }
            }
        }

        self.order_index.remove(&order_id);
        let order = self.orders.remove(key).order;
        trace!(
            order_id,
            price,
            side = %side,
            remaining = order.remaining,
            filled = order.filled_size(),
            "order cancelled"
        );

        Ok(order)
    }

    /// Look up a resting order by id
    pub fn get_order(&self, order_id: u64) -> Result<&Order> {
        self.order_index
            .get(&order_id)
            .and_then(|&key| self.orders.get(key))
            .map(|node| &node.order)
            .ok_or(EngineError::NotFound(order_id))
    }

    /// Check if an order is resting
    #[inline]
    pub fn contains_order(&self, order_id: u64) -> bool {
        self.order_index.contains_key(&order_id)
    }

    /// Resting orders of one user, asks then bids, best price first
    pub fn orders_for_user(&self, user_id: u64) -> Vec<&Order> {
        self.asks_by_price()
            .chain(self.bids_by_price())
            .flat_map(|level| self.orders_at(level))
            .filter(|order| order.user_id == user_id)
            .collect()
    }

    // ========================================================================
    // Best Bid/Ask
    // ========================================================================

    /// Get the best bid price (highest buy price)
    ///
    /// # Errors
    ///
    /// `NoLiquidity` if no bids rest on the book
    #[inline]
    pub fn best_bid(&self) -> Result<u64> {
        self.bids
            .keys()
            .next()
            .map(|r| r.0)
            .ok_or(EngineError::NoLiquidity(Side::Buy))
    }

    /// Get the best ask price (lowest sell price)
    ///
    /// # Errors
    ///
    /// `NoLiquidity` if no asks rest on the book
    #[inline]
    pub fn best_ask(&self) -> Result<u64> {
        self.asks
            .keys()
            .next()
            .copied()
            .ok_or(EngineError::NoLiquidity(Side::Sell))
    }

    /// Get the spread (best_ask - best_bid)
    ///
    /// `None` if either side is empty or the book is crossed.
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Ok(bid), Ok(ask)) if ask >= bid => Some(ask - bid),
            _ => None,
        }
    }

    /// Midpoint of best bid and best ask, rounded down
    pub fn mid_price(&self) -> Option<u64> {
        let bid = self.best_bid().ok()?;
        let ask = self.best_ask().ok()?;
        u64::try_from((bid as u128 + ask as u128) / 2).ok()
    }

    // ========================================================================
    // Volume and Levels
    // ========================================================================

    /// Sum of remaining sizes on the bid side
    pub fn total_bid_volume(&self) -> u64 {
        self.bids.values().map(Limit::total_volume).sum()
    }

    /// Sum of remaining sizes on the ask side
    pub fn total_ask_volume(&self) -> u64 {
        self.asks.values().map(Limit::total_volume).sum()
    }

    /// Total resting volume on one side
    pub fn side_volume(&self, side: Side) -> u64 {
        match side {
            Side::Buy => self.total_bid_volume(),
            Side::Sell => self.total_ask_volume(),
        }
    }

    /// Ask levels, lowest price first
    pub fn asks_by_price(&self) -> impl Iterator<Item = &Limit> + '_ {
        self.asks.values()
    }

    /// Bid levels, highest price first
    pub fn bids_by_price(&self) -> impl Iterator<Item = &Limit> + '_ {
        self.bids.values()
    }

    /// Orders resting on `level`, in time priority
    pub fn orders_at<'a>(&'a self, level: &Limit) -> impl Iterator<Item = &'a Order> + 'a {
        level
            .keys(&self.orders)
            .filter_map(move |key| self.orders.get(key))
            .map(|node| &node.order)
    }

    // ========================================================================
    // Trade History
    // ========================================================================

    /// Executed trades, oldest first
    pub fn trades(&self) -> impl Iterator<Item = &Trade> + '_ {
        self.trades.iter()
    }

    /// Up to `limit` most recent trades, newest first
    pub fn recent_trades(&self, limit: usize) -> Vec<Trade> {
        self.trades.iter().rev().take(limit).cloned().collect()
    }

    pub(super) fn record_trade(&mut self, trade: Trade) {
        if self.trade_history_limit == 0 {
            return;
        }
        if self.trades.len() == self.trade_history_limit {
            self.trades.pop_front();
        }
        self.trades.push_back(trade);
    }

    // ========================================================================
    // ID Generation
    // ========================================================================

    /// Get the next trade ID and increment the counter
    #[inline]
    pub(super) fn next_trade_id(&mut self) -> u64 {
        let id = self.next_trade_id;
        self.next_trade_id += 1;
        id
    }

    /// Get the current next order ID (without incrementing)
    #[inline]
    pub fn peek_next_order_id(&self) -> u64 {
        self.next_order_id
    }

    /// Assign an id and timestamp to an order entering the book
    ///
    /// Ids only move forward: a caller id below the counter was already
    /// handed out (resting, filled or cancelled) and is rejected.
    pub(super) fn stamp(&mut self, order: &mut Order) -> Result<()> {
        let id = match order.id {
            0 => self.next_order_id,
            id if id < self.next_order_id => {
                return Err(EngineError::invalid(
                    "id",
                    format!("order id {id} was already used"),
                ));
            }
            id => id,
        };
        let next = id
            .checked_add(1)
            .ok_or_else(|| EngineError::invalid("id", "order id space exhausted"))?;

        order.id = id;
        self.next_order_id = next;
        if order.timestamp == 0 {
            order.timestamp = monotonic_nanos();
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
