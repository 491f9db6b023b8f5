//! Read and write models for the ledger boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use veil_core::{Address, Amount, BatchId, OrderId, OrderStatus, Price};

/// On-ledger view of one order, as returned by the detail accessor.
///
/// This is the wire model, not the validated core [`veil_core::Order`]: a
/// zero limit price means "batch/market order" and a zero expiry means
/// "never", both decoded here into options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: OrderId,
    pub owner: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: Amount,
    pub limit_price: Option<Price>,
    pub expiry: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub batch_id: BatchId,
    pub submitted_at: DateTime<Utc>,
}

impl OrderDetails {
    pub fn is_limit(&self) -> bool {
        self.limit_price.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }
}

/// Ledger verdict on whether a limit order is executable right now.
///
/// Recomputed on every poll; never cached. A non-Pending order always
/// reports `can_execute == false`, which is what makes scheduler retries
/// idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDecision {
    pub can_execute: bool,
    pub current_price: Price,
    pub target_price: Price,
}

/// Confirmed outcome of a state-changing submission.
///
/// `success == false` is a ledger-reported failure (reverted transaction):
/// the call made it on chain and was refused there. Transport-level
/// problems surface as errors instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub success: bool,
    pub block_number: Option<u64>,
}

/// A batch (market) order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSubmission {
    /// Encrypted order payload; only the enclave can read it.
    pub payload: Vec<u8>,
    /// Reference to the protected dataset holding the decryption grant.
    pub dataset: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: Amount,
}

/// A limit order submission: a batch submission plus trigger terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitOrderSubmission {
    pub payload: Vec<u8>,
    pub dataset: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: Amount,
    pub limit_price: Price,
    pub expiry: Option<DateTime<Utc>>,
}
