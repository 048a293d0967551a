//! Error type shared by the order book, the market registry and config loading.
//!
//! Every variant is a local, recoverable condition. Nothing in the engine
//! treats a business outcome (empty side, thin liquidity) as fatal.

use thiserror::Error;

use crate::types::Side;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by engine operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A request field failed boundary validation
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Unknown order id on cancel or lookup
    #[error("order not found: {0}")]
    NotFound(u64),

    /// The opposite side cannot absorb the whole market order
    #[error("insufficient liquidity for {side} market order: requested {requested}, available {available}")]
    InsufficientLiquidity {
        /// Side of the incoming market order
        side: Side,
        /// Requested size (fixed-point)
        requested: u64,
        /// Total resting volume on the opposite side (fixed-point)
        available: u64,
    },

    /// Best-price query on a side with no active levels
    #[error("no liquidity on {0} side")]
    NoLiquidity(Side),

    /// No book is registered for the market symbol
    #[error("market not found: {0}")]
    MarketNotFound(String),

    /// A book is already registered for the market symbol
    #[error("market already exists: {0}")]
    MarketExists(String),

    /// A thread panicked while holding the market's book lock
    #[error("order book lock poisoned for market {0}")]
    LockPoisoned(String),

    /// SSZ encoding failed while computing the state root
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// The book's own indices disagree with each other
    #[error("order book corrupted: {0}")]
    Corrupted(String),
}

impl EngineError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
