//! Order node for slab-based storage.
//!
//! ## Design
//!
//! `OrderNode` wraps a resting `Order` with doubly-linked list pointers for
//! its price level's FIFO queue, plus a back-reference to the level it rests
//! on. Pointers are slab keys (`usize`), not references.
//!
//! ## Linked List
//!
//! Orders at the same price level form a doubly-linked list:
//! - `next`: the next (newer) order in the level
//! - `prev`: the previous (older) order in the level
//!
//! This allows O(1) removal from anywhere in the list.

use crate::types::{Order, Side};

/// Order node stored in the slab.
#[derive(Debug, Clone)]
pub struct OrderNode {
    /// The resting order
    pub order: Order,

    /// Next order in the level queue (slab key), None at the tail
    pub next: Option<usize>,

    /// Previous order in the level queue (slab key), None at the head
    pub prev: Option<usize>,

    /// Price of the level this order rests on, None while unrested
    pub level: Option<u64>,
}

impl OrderNode {
    /// Create a new, unrested order node
    ///
    /// ```
    /// use exchange_core::orderbook::OrderNode;
    /// use exchange_core::types::{Order, Side};
    ///
    /// let node = OrderNode::new(Order::limit(1, Side::Buy, 10_000_000_000, 100_000_000));
    /// assert!(node.is_unlinked());
    /// assert!(node.level.is_none());
    /// ```
    #[inline]
    pub fn new(order: Order) -> Self {
        Self {
            order,
            next: None,
            prev: None,
            level: None,
        }
    }

    /// Check if this node is unlinked from any neighbour
    #[inline]
    pub fn is_unlinked(&self) -> bool {
        self.next.is_none() && self.prev.is_none()
    }

    #[inline]
    pub fn order_id(&self) -> u64 {
        self.order.id
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.order.side()
    }

    #[inline]
    pub fn price(&self) -> u64 {
        self.order.price
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.order.remaining
    }

    /// Fill a portion of this order, returning the quantity actually filled
    #[inline]
    pub fn fill(&mut self, quantity: u64) -> u64 {
        self.order.fill(quantity)
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.order.is_filled()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
