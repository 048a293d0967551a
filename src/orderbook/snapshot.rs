//! Read-only views of a book and its state root.
//!
//! [`BookSnapshot`] is what callers hand to the transport layer: best prices,
//! side totals and every level with its orders, best price first. It is a
//! plain copy, so it stays valid after the book's lock is released.
//!
//! The state root is a SHA-256 digest over the SSZ encoding of every resting
//! order (asks then bids, best-first, FIFO within a level). Two books with the
//! same resting orders in the same priority produce the same root.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{EngineError, Result};
use crate::orderbook::{Limit, OrderBook};

/// One resting order as shown in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub id: u64,
    pub user_id: u64,
    /// Remaining size (fixed-point)
    pub size: u64,
    pub timestamp: u64,
}

/// One price level as shown in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelView {
    pub price: u64,
    pub total_volume: u64,
    /// Orders in time priority
    pub orders: Vec<OrderView>,
}

/// Point-in-time copy of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSnapshot {
    pub symbol: String,
    pub best_bid: Option<u64>,
    pub best_ask: Option<u64>,
    pub total_bid_volume: u64,
    pub total_ask_volume: u64,
    /// Ask levels, lowest price first
    pub asks: Vec<LevelView>,
    /// Bid levels, highest price first
    pub bids: Vec<LevelView>,
}

impl BookSnapshot {
    /// Render as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EngineError::Encoding(e.to_string()))
    }
}

impl OrderBook {
    /// Take a snapshot of both sides
    ///
    /// ```
    /// use exchange_core::orderbook::OrderBook;
    /// use exchange_core::types::{Order, Side};
    ///
    /// let mut book = OrderBook::new("ETH");
    /// book.place_limit_order(10_000_000_000, Order::limit(3, Side::Buy, 0, 100_000_000)).unwrap();
    ///
    /// let snapshot = book.snapshot();
    /// assert_eq!(snapshot.best_bid, Some(10_000_000_000));
    /// assert_eq!(snapshot.best_ask, None);
    /// assert_eq!(snapshot.bids[0].orders[0].user_id, 3);
    /// ```
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            symbol: self.symbol().to_string(),
            best_bid: self.best_bid().ok(),
            best_ask: self.best_ask().ok(),
            total_bid_volume: self.total_bid_volume(),
            total_ask_volume: self.total_ask_volume(),
            asks: self.asks_by_price().map(|l| self.level_view(l)).collect(),
            bids: self.bids_by_price().map(|l| self.level_view(l)).collect(),
        }
    }

    fn level_view(&self, level: &Limit) -> LevelView {
        LevelView {
            price: level.price,
            total_volume: level.total_volume(),
            orders: self
                .orders_at(level)
                .map(|order| OrderView {
                    id: order.id,
                    user_id: order.user_id,
                    size: order.remaining,
                    timestamp: order.timestamp,
                })
                .collect(),
        }
    }

    /// SHA-256 over the SSZ encoding of all resting orders
    pub fn state_root(&self) -> Result<[u8; 32]> {
        let mut hasher = Sha256::new();
        for level in self.asks_by_price().chain(self.bids_by_price()) {
            for order in self.orders_at(level) {
                let bytes = ssz_rs::serialize(order)
                    .map_err(|e| EngineError::Encoding(format!("{e:?}")))?;
                hasher.update(&bytes);
            }
        }

        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        Ok(root)
    }

    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> Result<String> {
        self.state_root().map(hex::encode)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
