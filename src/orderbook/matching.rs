//! Market order matching.
//!
//! ## Algorithm
//!
//! 1. Reject the order if the opposite side cannot absorb all of it
//! 2. Take the best opposite level (lowest ask / highest bid)
//! 3. Fill against it in time priority
//! 4. Drop filled resting orders; drop the level if it emptied
//! 5. Repeat while the order has remaining size
//!
//! Trades always execute at the resting level's price.
//!
//! ## Liquidity Policy
//!
//! Matching is all-or-nothing. A market order larger than the opposite
//! side's total volume fails with `InsufficientLiquidity` before any resting
//! order is touched, so a rejected order leaves the book unchanged.

use tracing::{debug, trace, warn};

use crate::error::{EngineError, Result};
use crate::orderbook::{LevelFill, OrderBook};
use crate::types::{MarketFill, Order, OrderType, Side, Trade};
use crate::utils::monotonic_nanos;

impl OrderBook {
    /// Execute a market order against the opposite side
    ///
    /// # Returns
    ///
    /// The fills in execution order: best level first, FIFO within a level.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a zero-size order
    /// - `InsufficientLiquidity` if the opposite side holds less than the
    ///   requested size; nothing is filled in that case
    ///
    /// # Example
    ///
    /// ```
    /// use exchange_core::orderbook::OrderBook;
    /// use exchange_core::types::{Order, Side};
    ///
    /// let mut book = OrderBook::new("ETH");
    /// book.place_limit_order(10_000_000_000, Order::limit(1, Side::Sell, 0, 500_000_000)).unwrap();
    /// book.place_limit_order(10_100_000_000, Order::limit(1, Side::Sell, 0, 500_000_000)).unwrap();
    ///
    /// let fill = book.place_market_order(Order::market(2, Side::Buy, 800_000_000)).unwrap();
    ///
    /// assert_eq!(fill.matches.len(), 2);
    /// assert_eq!(fill.matches[0].price, 10_000_000_000);
    /// assert_eq!(fill.matches[1].size_filled, 300_000_000);
    /// assert_eq!(book.total_ask_volume(), 200_000_000);
    /// ```
    pub fn place_market_order(&mut self, mut order: Order) -> Result<MarketFill> {
        let requested = order.remaining;
        if requested == 0 {
            return Err(EngineError::invalid("size", "must be positive"));
        }

        let side = order.side();
        let available = self.side_volume(side.opposite());
        if available < requested {
            warn!(
                market = %self.symbol(),
                side = %side,
                requested,
                available,
                "rejected market order: insufficient liquidity"
            );
            return Err(EngineError::InsufficientLiquidity {
                side,
                requested,
                available,
            });
        }

        order.price = 0;
        order.order_type_raw = OrderType::Market.to_u8();
        self.stamp(&mut order)?;

        let mut matches = Vec::new();
        while !order.is_filled() {
            let Some(fill) = self.fill_best_level(&mut order) else {
                break;
            };
            if fill.matches.is_empty() {
                break;
            }

            for key in fill.filled_keys {
                if self.orders.contains(key) {
                    let node = self.orders.remove(key);
                    self.order_index.remove(&node.order_id());
                    trace!(order_id = node.order_id(), "resting order filled");
                }
            }
            matches.extend(fill.matches);
        }

        let timestamp = monotonic_nanos();
        for fill in &matches {
            let trade_id = self.next_trade_id();
            self.record_trade(Trade::from_match(trade_id, fill, timestamp));
        }

        trace!(
            order_id = order.id,
            side = %side,
            requested,
            matches = matches.len(),
            "market order executed"
        );

        Ok(MarketFill {
            order_id: order.id,
            side,
            requested,
            matches,
        })
    }

    /// Fill against the best opposite level, removing it if it empties
    fn fill_best_level(&mut self, order: &mut Order) -> Option<LevelFill> {
        match order.side() {
            Side::Buy => {
                let mut entry = self.asks.first_entry()?;
                let fill = entry.get_mut().fill(order, &mut self.orders);
                if entry.get().is_empty() {
                    let level = entry.remove();
                    debug!(price = level.price, side = %level.side(), "removed empty price level");
                }
                Some(fill)
            }
            Side::Sell => {
                let mut entry = self.bids.first_entry()?;
                let fill = entry.get_mut().fill(order, &mut self.orders);
                if entry.get().is_empty() {
                    let level = entry.remove();
                    debug!(price = level.price, side = %level.side(), "removed empty price level");
                }
                Some(fill)
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
