//! Exchange configuration.
//!
//! Loaded from JSON; every field is optional and falls back to its default.
//!
//! ```
//! use exchange_core::config::ExchangeConfig;
//!
//! let config = ExchangeConfig::from_json_str(r#"{"markets":["ETH","BTC"]}"#).unwrap();
//! assert_eq!(config.markets, vec!["ETH", "BTC"]);
//! assert_eq!(config.order_capacity, 10_000);
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EngineError, Result};
use crate::orderbook::DEFAULT_TRADE_HISTORY_LIMIT;

/// Default number of pre-allocated order slots per book
pub const DEFAULT_ORDER_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeConfig {
    /// Market symbols to register at startup
    pub markets: Vec<String>,

    /// Pre-allocated order slots per book
    pub order_capacity: usize,

    /// Trades retained per book
    pub trade_history_limit: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            markets: vec!["ETH".to_string()],
            order_capacity: DEFAULT_ORDER_CAPACITY,
            trade_history_limit: DEFAULT_TRADE_HISTORY_LIMIT,
        }
    }
}

impl ExchangeConfig {
    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        if let Some(empty) = self.markets.iter().position(|m| m.trim().is_empty()) {
            return Err(EngineError::Config(format!("market #{empty} has an empty symbol")));
        }
        for (i, market) in self.markets.iter().enumerate() {
            if self.markets[..i].contains(market) {
                return Err(EngineError::Config(format!("market {market} listed twice")));
            }
        }
        Ok(())
    }
}
