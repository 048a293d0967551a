//! Price level management for orders at the same price.
//!
//! ## Design
//!
//! A [`Limit`] represents all resting orders at a single price on one side.
//! Orders are kept in a doubly-linked list threaded through the book's slab,
//! oldest first, so time priority is simply list order.
//!
//! ## Queue Structure
//!
//! ```text
//! head (oldest) <-> order2 <-> order3 <-> tail (newest)
//! ```
//!
//! - New orders are appended at the tail
//! - Matching consumes orders from the head
//! - Any order can be removed in O(1) using its slab key
//!
//! `total_volume` is adjusted on every add, remove and fill, so it always
//! equals the sum of the remaining sizes in the queue.

use slab::Slab;
use tracing::trace;

use crate::error::{EngineError, Result};
use crate::orderbook::OrderNode;
use crate::types::{Match, Order, Side};

/// A price level: resting orders at one price on one side, in arrival order.
#[derive(Debug, Clone)]
pub struct Limit {
    /// Price for this level (fixed-point)
    pub price: u64,

    /// Side every order in this level belongs to
    side: Side,

    /// Sum of remaining sizes of the queued orders
    total_volume: u64,

    /// Oldest order (slab key); first to be matched
    head: Option<usize>,

    /// Newest order (slab key); new orders are appended here
    tail: Option<usize>,

    /// Number of orders in the queue
    order_count: usize,
}

/// Result of filling an incoming order against one level
#[derive(Debug, Default)]
pub struct LevelFill {
    /// One match per resting order touched, in time order
    pub matches: Vec<Match>,

    /// Slab keys of resting orders that were fully filled and unlinked
    pub filled_keys: Vec<usize>,
}

impl Limit {
    /// Create a new empty price level
    pub fn new(price: u64, side: Side) -> Self {
        Self {
            price,
            side,
            total_volume: 0,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn total_volume(&self) -> u64 {
        self.total_volume
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Append an order to the tail of the queue
    ///
    /// Sets the node's level back-reference and adds its remaining size to
    /// the level volume. Side and price consistency is the caller's job.
    pub fn add(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> Result<()> {
        let node = slab
            .get_mut(key)
            .ok_or_else(|| EngineError::Corrupted(format!("no slab entry {key}")))?;
        let quantity = node.remaining();

        node.prev = self.tail;
        node.next = None;
        node.level = Some(self.price);

        match self.tail.and_then(|tail_key| slab.get_mut(tail_key)) {
            Some(tail_node) => tail_node.next = Some(key),
            None => self.head = Some(key),
        }

        self.tail = Some(key);
        self.order_count += 1;
        self.total_volume += quantity;

        Ok(())
    }

    /// Remove an order from the queue by slab key
    ///
    /// # Returns
    ///
    /// The remaining size of the removed order, subtracted from the level
    /// volume. `NotFound` if the order does not rest on this level.
    pub fn remove(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> Result<u64> {
        match slab.get(key) {
            Some(node) if node.level == Some(self.price) && node.side() == self.side => {}
            Some(node) => return Err(EngineError::NotFound(node.order_id())),
            None => return Err(EngineError::Corrupted(format!("no slab entry {key}"))),
        }
        Ok(self.unlink(key, slab))
    }

    /// Fill `incoming` against the queue in time order
    ///
    /// Each resting order considered yields one match at this level's price.
    /// Fully filled resting orders are unlinked after the scan completes;
    /// their slab keys are returned so the book can drop them from its
    /// indices.
    pub fn fill(&mut self, incoming: &mut Order, slab: &mut Slab<OrderNode>) -> LevelFill {
        let mut result = LevelFill::default();
        let taker_side = incoming.side();
        let mut cursor = self.head;

        while let Some(key) = cursor {
            if incoming.is_filled() {
                break;
            }
            let Some(node) = slab.get_mut(key) else {
                break;
            };
            cursor = node.next;

            let filled = node.remaining().min(incoming.remaining);
            node.fill(filled);
            incoming.fill(filled);
            self.total_volume -= filled;

            let resting = &node.order;
            let (bid, ask) = match taker_side {
                Side::Buy => (&*incoming, resting),
                Side::Sell => (resting, &*incoming),
            };
            result.matches.push(Match {
                bid_order_id: bid.id,
                bid_user_id: bid.user_id,
                ask_order_id: ask.id,
                ask_user_id: ask.user_id,
                price: self.price,
                size_filled: filled,
                taker_side_raw: taker_side.to_u8(),
            });

            trace!(
                price = self.price,
                resting_id = resting.id,
                filled,
                resting_left = resting.remaining,
                "filled resting order"
            );

            if node.is_filled() {
                result.filled_keys.push(key);
            }
        }

        for &key in &result.filled_keys {
            self.unlink(key, slab);
        }

        result
    }

    /// Iterate the queue's slab keys, oldest first
    pub fn keys<'a>(&self, slab: &'a Slab<OrderNode>) -> LevelKeys<'a> {
        LevelKeys {
            slab,
            cursor: self.head,
        }
    }

    /// Detach a node known to be in this queue
    fn unlink(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> u64 {
        let Some(node) = slab.get_mut(key) else {
            return 0;
        };
        let quantity = node.remaining();
        let prev_key = node.prev.take();
        let next_key = node.next.take();
        node.level = None;

        match prev_key.and_then(|prev| slab.get_mut(prev)) {
            Some(prev_node) => prev_node.next = next_key,
            None => self.head = next_key,
        }

        match next_key.and_then(|next| slab.get_mut(next)) {
            Some(next_node) => next_node.prev = prev_key,
            None => self.tail = prev_key,
        }

        self.order_count -= 1;
        self.total_volume -= quantity;

        quantity
    }
}

/// Iterator over a level's slab keys in time priority
pub struct LevelKeys<'a> {
    slab: &'a Slab<OrderNode>,
    cursor: Option<usize>,
}

impl Iterator for LevelKeys<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let key = self.cursor?;
        self.cursor = self.slab.get(key).and_then(|node| node.next);
        Some(key)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PRICE: u64 = 10_000_000_000; // 100.0

    fn create_test_node(slab: &mut Slab<OrderNode>, id: u64, side: Side, quantity: u64) -> usize {
        let mut order = Order::limit(id * 10, side, PRICE, quantity);
        order.id = id;
        order.timestamp = id;
        slab.insert(OrderNode::new(order))
    }

    fn queue(level: &Limit, slab: &Slab<OrderNode>) -> Vec<u64> {
        level.keys(slab).map(|k| slab[k].order_id()).collect()
    }

    #[test]
    fn test_limit_new() {
        let level = Limit::new(PRICE, Side::Buy);
        assert_eq!(level.price, PRICE);
        assert_eq!(level.total_volume(), 0);
        assert!(level.is_empty());
        assert_eq!(level.keys(&Slab::<OrderNode>::new()).count(), 0);
    }

    #[test]
    fn test_add_sets_back_reference_and_volume() {
        let mut slab = Slab::with_capacity(10);
        let mut level = Limit::new(PRICE, Side::Buy);

        let key1 = create_test_node(&mut slab, 1, Side::Buy, 100_000_000);
        let key2 = create_test_node(&mut slab, 2, Side::Buy, 200_000_000);
        level.add(key1, &mut slab).unwrap();
        level.add(key2, &mut slab).unwrap();

        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_volume(), 300_000_000);
        assert_eq!(slab[key1].level, Some(PRICE));
        assert_eq!(slab[key1].next, Some(key2));
        assert_eq!(slab[key2].prev, Some(key1));
        assert_eq!(queue(&level, &slab), vec![1, 2]);
    }

    #[test]
    fn test_remove_middle_keeps_order() {
        let mut slab = Slab::with_capacity(10);
        let mut level = Limit::new(PRICE, Side::Buy);

        let keys: Vec<usize> = (1..=3)
            .map(|id| create_test_node(&mut slab, id, Side::Buy, id * 100_000_000))
            .collect();
        for &key in &keys {
            level.add(key, &mut slab).unwrap();
        }

        let removed = level.remove(keys[1], &mut slab).unwrap();

        assert_eq!(removed, 200_000_000);
        assert_eq!(level.total_volume(), 400_000_000);
        assert_eq!(queue(&level, &slab), vec![1, 3]);
        assert!(slab[keys[1]].level.is_none());
        assert!(slab[keys[1]].is_unlinked());
    }

    #[test]
    fn test_remove_only_order_empties_level() {
        let mut slab = Slab::with_capacity(10);
        let mut level = Limit::new(PRICE, Side::Sell);

        let key = create_test_node(&mut slab, 1, Side::Sell, 100_000_000);
        level.add(key, &mut slab).unwrap();
        level.remove(key, &mut slab).unwrap();

        assert!(level.is_empty());
        assert_eq!(level.total_volume(), 0);
        assert_eq!(level.keys(&slab).count(), 0);
    }

    #[test]
    fn test_missing_slab_entry_is_corruption() {
        let mut slab: Slab<OrderNode> = Slab::with_capacity(4);
        let mut level = Limit::new(PRICE, Side::Buy);

        assert!(matches!(level.add(7, &mut slab), Err(EngineError::Corrupted(_))));
        assert!(matches!(level.remove(7, &mut slab), Err(EngineError::Corrupted(_))));
        assert!(level.is_empty());
    }

    #[test]
    fn test_remove_foreign_order_is_not_found() {
        let mut slab = Slab::with_capacity(10);
        let mut bids = Limit::new(PRICE, Side::Buy);
        let mut asks = Limit::new(PRICE, Side::Sell);

        let bid_key = create_test_node(&mut slab, 1, Side::Buy, 100_000_000);
        bids.add(bid_key, &mut slab).unwrap();

        // Same price, other side
        assert_eq!(asks.remove(bid_key, &mut slab), Err(EngineError::NotFound(1)));

        // Removed twice
        bids.remove(bid_key, &mut slab).unwrap();
        assert_eq!(bids.remove(bid_key, &mut slab), Err(EngineError::NotFound(1)));
        assert_eq!(bids.total_volume(), 0);
    }

    #[test]
    fn test_fill_partial_preserves_time_priority() {
        let mut slab = Slab::with_capacity(10);
        let mut level = Limit::new(PRICE, Side::Buy);

        let a = create_test_node(&mut slab, 1, Side::Buy, 500_000_000);
        let b = create_test_node(&mut slab, 2, Side::Buy, 500_000_000);
        level.add(a, &mut slab).unwrap();
        level.add(b, &mut slab).unwrap();

        let mut incoming = Order::market(99, Side::Sell, 700_000_000);
        incoming.id = 50;
        let fill = level.fill(&mut incoming, &mut slab);

        assert_eq!(fill.matches.len(), 2);
        assert_eq!(fill.matches[0].bid_order_id, 1);
        assert_eq!(fill.matches[0].size_filled, 500_000_000);
        assert_eq!(fill.matches[1].bid_order_id, 2);
        assert_eq!(fill.matches[1].size_filled, 200_000_000);
        assert_eq!(fill.matches[1].ask_order_id, 50);
        assert!(fill.matches.iter().all(|m| m.price == PRICE));

        assert_eq!(fill.filled_keys, vec![a]);
        assert!(incoming.is_filled());
        assert_eq!(slab[b].remaining(), 300_000_000);
        assert_eq!(level.total_volume(), 300_000_000);
        assert_eq!(queue(&level, &slab), vec![2]);
    }

    #[test]
    fn test_fill_exhausts_level() {
        let mut slab = Slab::with_capacity(10);
        let mut level = Limit::new(PRICE, Side::Sell);

        let a = create_test_node(&mut slab, 1, Side::Sell, 100_000_000);
        let b = create_test_node(&mut slab, 2, Side::Sell, 100_000_000);
        level.add(a, &mut slab).unwrap();
        level.add(b, &mut slab).unwrap();

        let mut incoming = Order::market(99, Side::Buy, 500_000_000);
        let fill = level.fill(&mut incoming, &mut slab);

        assert_eq!(fill.matches.len(), 2);
        assert_eq!(fill.filled_keys, vec![a, b]);
        assert!(level.is_empty());
        assert_eq!(level.total_volume(), 0);
        assert_eq!(incoming.remaining, 300_000_000);
    }

    #[test]
    fn test_fill_with_zero_size_yields_nothing() {
        let mut slab = Slab::with_capacity(10);
        let mut level = Limit::new(PRICE, Side::Sell);
        let a = create_test_node(&mut slab, 1, Side::Sell, 100_000_000);
        level.add(a, &mut slab).unwrap();

        let mut incoming = Order::market(99, Side::Buy, 0);
        let fill = level.fill(&mut incoming, &mut slab);

        assert!(fill.matches.is_empty());
        assert!(fill.filled_keys.is_empty());
        assert_eq!(level.total_volume(), 100_000_000);
    }
}
