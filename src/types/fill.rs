//! Fill events produced by the matching algorithm.
//!
//! A [`Match`] is transient: the book hands it back to the caller and records
//! a [`Trade`](crate::types::Trade) copy in its history, but never indexes it.

use ssz_rs::prelude::*;

use crate::types::Side;

/// One fill between a resting (maker) order and an incoming (taker) order.
///
/// The price is always the resting level's price, never the aggressor's.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize, serde::Serialize)]
pub struct Match {
    /// Bid-side order id
    pub bid_order_id: u64,

    /// Bid-side user id
    pub bid_user_id: u64,

    /// Ask-side order id
    pub ask_order_id: u64,

    /// Ask-side user id
    pub ask_user_id: u64,

    /// Execution price in fixed-point (the resting level's price)
    pub price: u64,

    /// Filled size in fixed-point
    pub size_filled: u64,

    /// Side of the incoming order as u8 (0=Buy, 1=Sell)
    pub taker_side_raw: u8,
}

impl Match {
    /// Side of the incoming order that triggered this fill
    pub fn taker_side(&self) -> Side {
        Side::from_u8(self.taker_side_raw).unwrap_or(Side::Buy)
    }

    /// Id of the resting order
    pub fn maker_order_id(&self) -> u64 {
        match self.taker_side() {
            Side::Buy => self.ask_order_id,
            Side::Sell => self.bid_order_id,
        }
    }

    /// User owning the resting order
    pub fn maker_user_id(&self) -> u64 {
        match self.taker_side() {
            Side::Buy => self.ask_user_id,
            Side::Sell => self.bid_user_id,
        }
    }

    /// Id of the incoming order
    pub fn taker_order_id(&self) -> u64 {
        match self.taker_side() {
            Side::Buy => self.bid_order_id,
            Side::Sell => self.ask_order_id,
        }
    }

    /// User owning the incoming order
    pub fn taker_user_id(&self) -> u64 {
        match self.taker_side() {
            Side::Buy => self.bid_user_id,
            Side::Sell => self.ask_user_id,
        }
    }
}

/// Outcome of a fully executed market order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MarketFill {
    /// Id the book assigned to the market order
    pub order_id: u64,

    /// Side of the market order
    pub side: Side,

    /// Requested size in fixed-point
    pub requested: u64,

    /// Fills in execution order: best level first, FIFO within a level
    pub matches: Vec<Match>,
}

impl MarketFill {
    /// Total size filled across all matches
    pub fn filled(&self) -> u64 {
        self.matches.iter().map(|m| m.size_filled).sum()
    }

    /// Volume-weighted average execution price, `None` without fills
    pub fn average_price(&self) -> Option<u64> {
        let filled: u128 = self.matches.iter().map(|m| m.size_filled as u128).sum();
        if filled == 0 {
            return None;
        }
        let notional: u128 = self
            .matches
            .iter()
            .map(|m| m.price as u128 * m.size_filled as u128)
            .sum();
        u64::try_from(notional / filled).ok()
    }

    /// Number of price levels touched
    pub fn levels_touched(&self) -> usize {
        let mut levels = 0;
        let mut last = None;
        for m in &self.matches {
            if last != Some(m.price) {
                levels += 1;
                last = Some(m.price);
            }
        }
        levels
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
