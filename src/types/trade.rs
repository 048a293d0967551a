//! Trade records kept in each book's execution history.
//!
//! A trade is a [`Match`] stamped with a per-book sequence id and the time it
//! executed. The book keeps them so callers can query recent executions for a
//! market after the matching call has returned.

use crate::types::price;
use crate::types::{Match, Side};

/// A single executed fill between a maker and a taker order.
///
/// ## Price Discovery
///
/// The trade always executes at the maker's price (the resting level's price).
///
/// ## Example
///
/// ```
/// use exchange_core::types::{Match, Side, Trade};
///
/// let fill = Match {
///     bid_order_id: 2,
///     bid_user_id: 20,
///     ask_order_id: 1,
///     ask_user_id: 10,
///     price: 10_000_000_000,
///     size_filled: 500_000_000,
///     taker_side_raw: Side::Buy.to_u8(),
/// };
/// let trade = Trade::from_match(1, &fill, 1_703_577_600_000_000_000);
///
/// assert_eq!(trade.maker_order_id, 1);
/// assert_eq!(trade.taker_order_id, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Trade {
    /// Sequence id, unique within the book
    pub id: u64,

    /// Maker order ID (the resting order)
    pub maker_order_id: u64,

    /// Taker order ID (the incoming market order)
    pub taker_order_id: u64,

    /// Maker user/account ID
    pub maker_user_id: u64,

    /// Taker user/account ID
    pub taker_user_id: u64,

    /// Side of the taker
    pub taker_side: Side,

    /// Execution price in fixed-point
    pub price: u64,

    /// Executed quantity in fixed-point
    pub size: u64,

    /// Execution timestamp (ns)
    pub timestamp: u64,
}

impl Trade {
    /// Record a fill as a trade
    pub fn from_match(id: u64, fill: &Match, timestamp: u64) -> Self {
        Self {
            id,
            maker_order_id: fill.maker_order_id(),
            taker_order_id: fill.taker_order_id(),
            maker_user_id: fill.maker_user_id(),
            taker_user_id: fill.taker_user_id(),
            taker_side: fill.taker_side(),
            price: fill.price,
            size: fill.size_filled,
            timestamp,
        }
    }

    /// Notional value of this trade (price * size) in fixed-point
    ///
    /// Returns `None` if the product does not fit in u64.
    pub fn notional(&self) -> Option<u64> {
        price::checked_notional(self.price, self.size)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sell_fill() -> Match {
        Match {
            bid_order_id: 11,
            bid_user_id: 1,
            ask_order_id: 22,
            ask_user_id: 2,
            price: 10_000_000_000, // 100.0
            size_filled: 200_000_000, // 2.0
            taker_side_raw: Side::Sell.to_u8(),
        }
    }

    #[test]
    fn test_trade_from_sell_match() {
        let trade = Trade::from_match(5, &sell_fill(), 42);

        assert_eq!(trade.id, 5);
        assert_eq!(trade.maker_order_id, 11);
        assert_eq!(trade.maker_user_id, 1);
        assert_eq!(trade.taker_order_id, 22);
        assert_eq!(trade.taker_user_id, 2);
        assert_eq!(trade.taker_side, Side::Sell);
        assert_eq!(trade.price, 10_000_000_000);
        assert_eq!(trade.size, 200_000_000);
        assert_eq!(trade.timestamp, 42);
    }

    #[test]
    fn test_trade_notional() {
        let trade = Trade::from_match(1, &sell_fill(), 0);
        // 100.0 * 2.0 = 200.0
        assert_eq!(trade.notional(), Some(20_000_000_000));
    }

    #[test]
    fn test_trade_serializes_to_json() {
        let trade = Trade::from_match(1, &sell_fill(), 0);
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["taker_side"], "sell");
        assert_eq!(json["size"], 200_000_000u64);
    }
}
