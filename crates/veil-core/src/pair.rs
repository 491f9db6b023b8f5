//! Canonical trading-pair identification.
//!
//! Every order names a directed swap (`token_in` → `token_out`), but the
//! auction clears unordered pairs. Canonicalizing the pair (base = byte-wise
//! smaller address) puts an A→B order and its mirror B→A order in the same
//! bucket, on opposite sides, so each order participates in exactly one
//! clearing per batch.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a canonical pair an order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairSide {
    /// Selling the base asset for the quote asset.
    Sell,
    /// Selling the quote asset for the base asset.
    Buy,
}

impl PairSide {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Sell => Self::Buy,
            Self::Buy => Self::Sell,
        }
    }
}

impl fmt::Display for PairSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sell => write!(f, "sell"),
            Self::Buy => write!(f, "buy"),
        }
    }
}

/// Unordered asset pair in canonical orientation.
///
/// Invariant: `base < quote` byte-wise. Construct through
/// [`TradingPair::canonical`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: Address,
    pub quote: Address,
}

impl TradingPair {
    /// Build the canonical pair for two distinct assets.
    ///
    /// Returns `None` when both addresses are identical; a self-pair is
    /// never tradeable.
    pub fn canonical(a: Address, b: Address) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { base: a, quote: b }),
            std::cmp::Ordering::Greater => Some(Self { base: b, quote: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The side an order takes when it sells `token_in` into this pair.
    pub fn side_of(&self, token_in: Address) -> PairSide {
        if token_in == self.base {
            PairSide::Sell
        } else {
            PairSide::Buy
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
