//! The ledger interface the keeper and tooling program against.

use std::pin::Pin;
use std::sync::Arc;

use veil_core::{Address, BatchId, OrderId, Price};

use crate::error::LedgerResult;
use crate::types::{
    ExecutionDecision, LimitOrderSubmission, OrderDetails, OrderSubmission, TxReceipt,
};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Object-safe ledger interface.
///
/// Reads have no ordering constraints and may be issued concurrently.
/// Writes go through the implementation's single signing identity, and
/// every implementation must serialize them: a write method resolves only
/// after the submitted transaction is confirmed (or definitively failed),
/// and no second write from the same identity starts before that.
pub trait Ledger: Send + Sync {
    // --- reads ---

    fn current_batch_id(&self) -> BoxFuture<'_, LedgerResult<BatchId>>;

    fn pending_order_count(&self) -> BoxFuture<'_, LedgerResult<u64>>;

    fn pending_order_id_at(&self, index: u64) -> BoxFuture<'_, LedgerResult<OrderId>>;

    fn order_details(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<OrderDetails>>;

    fn can_execute_limit_order(&self, id: OrderId)
        -> BoxFuture<'_, LedgerResult<ExecutionDecision>>;

    fn current_price(&self, token: Address) -> BoxFuture<'_, LedgerResult<Price>>;

    // --- writes ---

    fn submit_order(&self, submission: OrderSubmission) -> BoxFuture<'_, LedgerResult<OrderId>>;

    fn submit_limit_order(
        &self,
        submission: LimitOrderSubmission,
    ) -> BoxFuture<'_, LedgerResult<OrderId>>;

    fn cancel_order(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<TxReceipt>>;

    fn execute_limit_order(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<TxReceipt>>;

    fn push_prices(&self, updates: Vec<(Address, Price)>) -> BoxFuture<'_, LedgerResult<TxReceipt>>;
}

/// Shared handle to a ledger implementation.
pub type DynLedger = Arc<dyn Ledger>;
