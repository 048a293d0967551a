//! Core data types for the exchange engine
//!
//! All numeric values use fixed-point representation (scaled by 10^8);
//! floats only exist in inbound requests and are converted at validation.
//!
//! ## Types
//!
//! - [`Order`]: A limit or market order
//! - [`Side`]: Buy (bid) or Sell (ask)
//! - [`OrderType`]: Limit or Market
//! - [`Match`]: One fill event produced by matching
//! - [`MarketFill`]: Outcome of an executed market order
//! - [`Trade`]: A fill recorded in a book's execution history
//! - [`OrderRequest`]: Typed inbound request (limit, market, cancel)

mod fill;
mod order;
mod request;
mod trade;
pub mod price;

pub use fill::{MarketFill, Match};
pub use order::{Order, OrderType, Side};
pub use request::{CancelRequest, LimitOrderRequest, MarketOrderRequest, OrderRequest};
pub use trade::Trade;
