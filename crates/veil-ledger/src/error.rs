//! Ledger error types.

use thiserror::Error;
use veil_core::{CoreError, OrderId};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Missing signing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("RPC transport error: {0}")]
    Rpc(String),

    #[error("Contract call failed: {0}")]
    Call(String),

    #[error("Transaction dropped before confirmation: {0}")]
    ReceiptMissing(String),

    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    #[error("Malformed on-chain value: {0}")]
    Codec(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
