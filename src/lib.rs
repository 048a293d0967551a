//! # Exchange Core
//!
//! In-memory limit order book and matching engine for a spot trading venue.
//!
//! ## Architecture
//!
//! The crate consists of:
//! - **Types**: Core data structures (Order, Match, Trade, typed requests)
//! - **OrderBook**: Per-market book with slab-based memory allocation and
//!   price-time priority matching
//! - **Exchange**: Registry of books by market symbol, with settlement hand-off
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Same resting orders, same state root
//! 2. **No Floating Point**: Floats are converted once at the request boundary;
//!    all book math uses fixed-point arithmetic (10^8 scaling)
//! 3. **Pre-allocated Memory**: Slab allocation for O(1) order operations
//! 4. **Synchronous Execution**: Every book operation runs to completion under
//!    its market's lock
//!
//! ## Matching Rules
//!
//! - Limit orders rest; they are never matched on admission
//! - Market orders walk the opposite side, best price first, FIFO per level
//! - A market order that cannot be filled in full is rejected untouched

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Order, Match, Trade, requests
pub mod types;

/// Order book: price levels, matching, snapshots
pub mod orderbook;

/// Market registry and settlement hand-off
pub mod exchange;

/// Exchange configuration
pub mod config;

/// Crate error type
pub mod error;

/// Clock helpers
pub mod utils;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::ExchangeConfig;
pub use error::{EngineError, Result};
pub use exchange::{Exchange, Market, OrderAck, Settlement, SettlementInstruction};
pub use orderbook::{BookSnapshot, Limit, OrderBook};
pub use types::{MarketFill, Match, Order, OrderRequest, OrderType, Side, Trade};
