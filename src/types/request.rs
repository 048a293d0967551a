//! Strongly-typed inbound requests.
//!
//! The transport layer decodes client payloads into [`OrderRequest`]; every
//! float is validated and converted to fixed-point here, before anything
//! reaches a book.
//!
//! ```
//! use exchange_core::types::{OrderRequest, Side};
//!
//! let json = r#"{"type":"limit","user_id":8,"side":"ask","size":10.0,"price":100.0}"#;
//! let request: OrderRequest = serde_json::from_str(json).unwrap();
//!
//! let OrderRequest::Limit(limit) = request else { panic!("expected limit") };
//! let order = limit.validate().unwrap();
//! assert_eq!(order.side(), Side::Sell);
//! assert_eq!(order.price, 10_000_000_000);
//! ```

use serde::Deserialize;

use crate::error::{EngineError, Result};
use crate::types::price;
use crate::types::{Order, Side};

/// Any request a client can route to a market's book
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderRequest {
    /// Rest a limit order on the book
    Limit(LimitOrderRequest),
    /// Execute a market order against the opposite side
    Market(MarketOrderRequest),
    /// Cancel a resting order
    Cancel(CancelRequest),
}

/// Limit order as quoted by the client
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LimitOrderRequest {
    pub user_id: u64,
    pub side: Side,
    pub size: f64,
    pub price: f64,
}

/// Market order as quoted by the client
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketOrderRequest {
    pub user_id: u64,
    pub side: Side,
    pub size: f64,
}

/// Cancellation of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CancelRequest {
    pub order_id: u64,
}

impl LimitOrderRequest {
    /// Validate and convert into an unplaced limit order
    pub fn validate(&self) -> Result<Order> {
        let size = positive_fixed("size", self.size)?;
        let price = positive_fixed("price", self.price)?;
        Ok(Order::limit(self.user_id, self.side, price, size))
    }
}

impl MarketOrderRequest {
    /// Validate and convert into a transient market order
    pub fn validate(&self) -> Result<Order> {
        let size = positive_fixed("size", self.size)?;
        Ok(Order::market(self.user_id, self.side, size))
    }
}

/// Convert a boundary float into a strictly positive fixed-point value
fn positive_fixed(field: &'static str, value: f64) -> Result<u64> {
    if !value.is_finite() {
        return Err(EngineError::invalid(field, format!("{value} is not finite")));
    }
    if value <= 0.0 {
        return Err(EngineError::invalid(field, format!("{value} must be positive")));
    }
    match price::from_f64(value) {
        Some(0) => Err(EngineError::invalid(
            field,
            format!("{value} is below the 1e-8 tick"),
        )),
        Some(fixed) => Ok(fixed),
        None => Err(EngineError::invalid(field, format!("{value} is out of range"))),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
