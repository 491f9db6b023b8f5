//! Batch windows and clearing outputs.

use crate::address::OrderId;
use crate::decimal::{Amount, Price};
use crate::pair::TradingPair;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically increasing batch window identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct BatchId(pub u64);

impl BatchId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A time-boxed window of orders considered together.
///
/// Closed (immutable) once matching has run; orders are referenced by id,
/// never owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub orders: Vec<OrderId>,
}

/// Uniform-clearing outcome for one pair in one batch.
///
/// `clearing_price` is total buy volume over total sell volume, computed in
/// `Decimal` (28 significant digits, round half-even). Handed to the ledger
/// as a settlement instruction; never persisted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingResult {
    pub pair: TradingPair,
    pub clearing_price: Price,
    pub matched_buy_count: u32,
    pub matched_sell_count: u32,
    pub total_volume: Amount,
}
