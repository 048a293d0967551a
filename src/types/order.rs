//! Order types for the matching engine.
//!
//! ## SSZ Serialization
//!
//! `Order` derives `SimpleSerialize` from ssz_rs so every resting order has
//! one canonical byte encoding. The book state root is built from it.
//!
//! ## Fixed-Point Representation
//!
//! Prices and sizes are stored as u64 scaled by 10^8 (see `types::price`).
//! Market orders carry price 0; they never rest on a level.

use std::fmt;

use ssz_rs::prelude::*;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy (bid) or Sell (ask)
///
/// Represented as u8 inside `Order` for SSZ compatibility:
/// - Buy = 0
/// - Sell = 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid)
    #[default]
    #[serde(alias = "bid")]
    Buy,
    /// Sell order (ask)
    #[serde(alias = "ask")]
    Sell,
}

impl Side {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        }
    }

    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    #[inline]
    pub fn is_bid(self) -> bool {
        self == Side::Buy
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BID"),
            Side::Sell => f.write_str("ASK"),
        }
    }
}

// ============================================================================
// OrderType enum
// ============================================================================

/// Order type enumeration
///
/// Only limit and market orders exist; there are no stop, iceberg or
/// time-in-force variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Rests on the book at its price until filled by a market order or cancelled
    #[default]
    Limit,
    /// Consumes opposite-side liquidity immediately; never rests
    Market,
}

impl OrderType {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            OrderType::Limit => 0,
            OrderType::Market => 1,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(OrderType::Limit),
            1 => Some(OrderType::Market),
            _ => None,
        }
    }
}

// ============================================================================
// Order struct
// ============================================================================

/// An order admitted to (or matched against) the book.
///
/// Identity (`id`, `user_id`, side, `timestamp`) never changes once the book
/// has accepted the order; only `remaining` moves, and only downwards.
///
/// ## SSZ Layout
///
/// Fixed-size container: 8+8+1+1+8+8+8+8 = 50 bytes.
///
/// ## Example
///
/// ```
/// use exchange_core::types::{Order, Side};
///
/// // Sell 10 units at 100.0
/// let order = Order::limit(7, Side::Sell, 10_000_000_000, 1_000_000_000);
/// assert_eq!(order.remaining, 1_000_000_000);
/// assert!(!order.is_bid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct Order {
    /// Unique order identifier (0 = let the book assign one)
    pub id: u64,

    /// Owning user/account identifier
    pub user_id: u64,

    /// Order side as u8 (0=Buy, 1=Sell)
    pub side_raw: u8,

    /// Order type as u8 (0=Limit, 1=Market)
    pub order_type_raw: u8,

    /// Limit price in fixed-point; 0 for market orders
    pub price: u64,

    /// Original size in fixed-point
    pub size: u64,

    /// Remaining size; the order is filled exactly when this is 0
    pub remaining: u64,

    /// Creation timestamp (ns); the sole tie-break inside a level
    pub timestamp: u64,
}

impl Order {
    /// Create an order with every field given explicitly
    ///
    /// # Arguments
    ///
    /// * `id` - Unique order identifier (0 = auto-assign on admission)
    /// * `user_id` - User/account identifier
    /// * `side` - Buy or Sell
    /// * `order_type` - Limit or Market
    /// * `price` - Price in fixed-point (0 for market orders)
    /// * `size` - Size in fixed-point
    /// * `timestamp` - Creation timestamp (0 = stamp on admission)
    pub fn new(
        id: u64,
        user_id: u64,
        side: Side,
        order_type: OrderType,
        price: u64,
        size: u64,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            user_id,
            side_raw: side.to_u8(),
            order_type_raw: order_type.to_u8(),
            price,
            size,
            remaining: size,
            timestamp,
        }
    }

    /// Unplaced limit order; id and timestamp are assigned by the book
    pub fn limit(user_id: u64, side: Side, price: u64, size: u64) -> Self {
        Self::new(0, user_id, side, OrderType::Limit, price, size, 0)
    }

    /// Transient market order; id and timestamp are assigned by the book
    pub fn market(user_id: u64, side: Side, size: u64) -> Self {
        Self::new(0, user_id, side, OrderType::Market, 0, size, 0)
    }

    /// Get the order side
    pub fn side(&self) -> Side {
        Side::from_u8(self.side_raw).unwrap_or(Side::Buy)
    }

    #[inline]
    pub fn is_bid(&self) -> bool {
        self.side().is_bid()
    }

    /// Get the order type
    pub fn order_type(&self) -> OrderType {
        OrderType::from_u8(self.order_type_raw).unwrap_or(OrderType::Limit)
    }

    /// Check if the order is fully filled
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    /// Get the filled quantity
    pub fn filled_size(&self) -> u64 {
        self.size.saturating_sub(self.remaining)
    }

    /// Fill a portion of this order
    ///
    /// # Returns
    ///
    /// The quantity actually filled; never more than `remaining`
    pub fn fill(&mut self, fill_qty: u64) -> u64 {
        let actual_fill = fill_qty.min(self.remaining);
        self.remaining -= actual_fill;
        actual_fill
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
