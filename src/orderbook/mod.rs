//! Order book module for the exchange engine.
//!
//! ## Architecture
//!
//! Each market has one [`OrderBook`] with:
//!
//! - **Slab-based storage**: O(1) order insertion, removal, and lookup
//! - **Price levels**: Orders grouped by price in a BTreeMap per side
//! - **Price-time priority**: FIFO ordering at each price level
//!
//! ## Components
//!
//! - [`OrderNode`]: Wrapper around `Order` with linked-list pointers for its level
//! - [`Limit`]: Collection of orders at a single price point
//! - [`OrderBook`]: Both sides, the id index, matching and trade history
//! - [`BookSnapshot`]: Serializable copy of the book for callers
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Place limit order | O(log n) |
//! | Cancel order by ID | O(log n) |
//! | Best bid/ask | O(log n) |
//! | Market order | O(k + m log n) for k fills across m levels |
//! | Side volume | O(levels) |
//!
//! ## Example
//!
//! ```
//! use exchange_core::orderbook::OrderBook;
//! use exchange_core::types::{Order, Side};
//!
//! let mut book = OrderBook::with_capacity("ETH", 10_000);
//!
//! // Bid 1.0 at 50,000
//! book.place_limit_order(5_000_000_000_000, Order::limit(100, Side::Buy, 0, 100_000_000)).unwrap();
//!
//! assert_eq!(book.best_bid(), Ok(5_000_000_000_000));
//! ```

mod book;
mod level;
mod matching;
mod node;
mod snapshot;

pub use book::{OrderBook, DEFAULT_TRADE_HISTORY_LIMIT};
pub use level::{LevelFill, LevelKeys, Limit};
pub use node::OrderNode;
pub use snapshot::{BookSnapshot, LevelView, OrderView};
