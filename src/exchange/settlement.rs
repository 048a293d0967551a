//! Settlement hand-off for executed matches.
//!
//! The engine does not move value. Once a market order's matches are final
//! and the book's lock is released, each match is turned into a
//! [`SettlementInstruction`] and passed to a [`Settlement`] implementation.
//! A failed settlement is reported back as an error and logged; it never
//! rolls back the book.

use thiserror::Error;
use tracing::info;

use crate::exchange::Market;
use crate::types::Match;

/// Failure reported by a settlement collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("settlement failed: {0}")]
pub struct SettlementError(pub String);

/// Transfer owed for one match
///
/// The bid side pays, the ask side receives. `amount` is the filled size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SettlementInstruction {
    pub payer_user_id: u64,
    pub payee_user_id: u64,
    /// Filled size (fixed-point)
    pub amount: u64,
    /// Execution price (fixed-point)
    pub price: u64,
}

impl SettlementInstruction {
    pub fn from_match(fill: &Match) -> Self {
        Self {
            payer_user_id: fill.bid_user_id,
            payee_user_id: fill.ask_user_id,
            amount: fill.size_filled,
            price: fill.price,
        }
    }
}

/// Collaborator that carries out transfers for executed matches
///
/// Implementations own their retry and failure policy.
pub trait Settlement: Send + Sync {
    fn settle(
        &self,
        market: &Market,
        instruction: &SettlementInstruction,
    ) -> Result<(), SettlementError>;
}

/// Settlement that only logs each instruction
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSettlement;

impl Settlement for LoggingSettlement {
    fn settle(
        &self,
        market: &Market,
        instruction: &SettlementInstruction,
    ) -> Result<(), SettlementError> {
        info!(
            market = %market,
            payer = instruction.payer_user_id,
            payee = instruction.payee_user_id,
            amount = instruction.amount,
            price = instruction.price,
            "settlement instruction"
        );
        Ok(())
    }
}
