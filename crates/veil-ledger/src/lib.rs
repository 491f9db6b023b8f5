//! Ledger access for the veil exchange.
//!
//! The ledger (an on-chain settlement contract plus its price vault) is the
//! single source of truth for order and price state. This crate provides:
//! - [`Ledger`]: the object-safe interface the keeper programs against
//! - [`RpcLedger`]: the JSON-RPC implementation with a signing wallet
//! - [`MemoryLedger`]: a deterministic in-memory double for tests
//!
//! All state-changing calls from one signing identity are serialized inside
//! the implementation: a second write never goes out before the previous
//! confirmation is observed.

pub mod client;
pub mod error;
pub mod memory;
pub mod rpc;
pub mod types;

pub use client::{BoxFuture, DynLedger, Ledger};
pub use error::{LedgerError, LedgerResult};
pub use memory::MemoryLedger;
pub use rpc::RpcLedger;
pub use types::{
    ExecutionDecision, LimitOrderSubmission, OrderDetails, OrderSubmission, TxReceipt,
};
