//! Deterministic in-memory ledger for tests.
//!
//! Mimics the settlement contract's observable behavior: executing a
//! pending limit order flips it to Executed, after which the execution
//! predicate reports false, which is the property the keeper's idempotence rests
//! on. Faults can be injected one call at a time to exercise the keeper's
//! per-order error isolation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use veil_core::{Address, BatchId, OrderId, OrderStatus, Price};

use crate::client::{BoxFuture, Ledger};
use crate::error::{LedgerError, LedgerResult};
use crate::types::{
    ExecutionDecision, LimitOrderSubmission, OrderDetails, OrderSubmission, TxReceipt,
};

#[derive(Default)]
pub struct MemoryLedger {
    orders: DashMap<OrderId, OrderDetails>,
    /// Enumeration order for pending ids, matching the contract's array.
    pending: Mutex<Vec<OrderId>>,
    prices: DashMap<Address, Price>,
    batch_id: AtomicU64,
    /// Every pushed price vector, oldest first.
    pushes: Mutex<Vec<Vec<(Address, Price)>>>,
    /// Ids of orders whose execution succeeded, in submission order.
    executed: Mutex<Vec<OrderId>>,
    /// Number of execution transactions submitted (including reverts).
    execution_attempts: AtomicU64,
    fail_next_read: AtomicBool,
    revert_next_execution: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an order. Pending orders join the enumeration array.
    pub fn insert_order(&self, details: OrderDetails) {
        if details.status == OrderStatus::Pending {
            self.pending.lock().push(details.id);
        }
        self.orders.insert(details.id, details);
    }

    /// Force an id into the pending enumeration regardless of status,
    /// simulating a stale index between a count read and a detail read.
    pub fn force_enumeration(&self, id: OrderId) {
        let mut pending = self.pending.lock();
        if !pending.contains(&id) {
            pending.push(id);
        }
    }

    pub fn set_price(&self, token: Address, price: Price) {
        self.prices.insert(token, price);
    }

    pub fn set_batch_id(&self, id: u64) {
        self.batch_id.store(id, Ordering::SeqCst);
    }

    /// Make the next `order_details` or `can_execute_limit_order` call fail
    /// with a transport error.
    pub fn inject_read_failure(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Make the next execution submission revert (ledger-reported failure).
    pub fn revert_next_execution(&self) {
        self.revert_next_execution.store(true, Ordering::SeqCst);
    }

    pub fn executed_orders(&self) -> Vec<OrderId> {
        self.executed.lock().clone()
    }

    pub fn execution_attempts(&self) -> u64 {
        self.execution_attempts.load(Ordering::SeqCst)
    }

    pub fn price_pushes(&self) -> Vec<Vec<(Address, Price)>> {
        self.pushes.lock().clone()
    }

    pub fn order_status(&self, id: OrderId) -> Option<OrderStatus> {
        self.orders.get(&id).map(|o| o.status)
    }

    fn take_read_failure(&self) -> bool {
        self.fail_next_read.swap(false, Ordering::SeqCst)
    }

    fn decide(&self, details: &OrderDetails) -> ExecutionDecision {
        let target = details.limit_price.unwrap_or(Price::ZERO);
        let current = self
            .prices
            .get(&details.token_in)
            .map(|p| *p)
            .unwrap_or(Price::ZERO);
        ExecutionDecision {
            can_execute: details.status == OrderStatus::Pending
                && details.limit_price.is_some()
                && current >= target,
            current_price: current,
            target_price: target,
        }
    }

    fn ok_receipt(&self, label: &str) -> TxReceipt {
        TxReceipt {
            tx_hash: format!("0xmem-{label}"),
            success: true,
            block_number: Some(self.batch_id.load(Ordering::SeqCst)),
        }
    }

    fn reverted_receipt(&self, label: &str) -> TxReceipt {
        TxReceipt {
            tx_hash: format!("0xmem-{label}"),
            success: false,
            block_number: None,
        }
    }
}

impl Ledger for MemoryLedger {
    fn current_batch_id(&self) -> BoxFuture<'_, LedgerResult<BatchId>> {
        Box::pin(async move { Ok(BatchId::new(self.batch_id.load(Ordering::SeqCst))) })
    }

    fn pending_order_count(&self) -> BoxFuture<'_, LedgerResult<u64>> {
        Box::pin(async move { Ok(self.pending.lock().len() as u64) })
    }

    fn pending_order_id_at(&self, index: u64) -> BoxFuture<'_, LedgerResult<OrderId>> {
        Box::pin(async move {
            self.pending
                .lock()
                .get(index as usize)
                .copied()
                .ok_or_else(|| LedgerError::Rpc(format!("pending index {index} out of range")))
        })
    }

    fn order_details(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<OrderDetails>> {
        Box::pin(async move {
            if self.take_read_failure() {
                return Err(LedgerError::Rpc("injected read failure".into()));
            }
            self.orders
                .get(&id)
                .map(|o| o.clone())
                .ok_or(LedgerError::UnknownOrder(id))
        })
    }

    fn can_execute_limit_order(
        &self,
        id: OrderId,
    ) -> BoxFuture<'_, LedgerResult<ExecutionDecision>> {
        Box::pin(async move {
            if self.take_read_failure() {
                return Err(LedgerError::Rpc("injected read failure".into()));
            }
            let details = self
                .orders
                .get(&id)
                .map(|o| o.clone())
                .ok_or(LedgerError::UnknownOrder(id))?;
            Ok(self.decide(&details))
        })
    }

    fn current_price(&self, token: Address) -> BoxFuture<'_, LedgerResult<Price>> {
        Box::pin(async move {
            Ok(self.prices.get(&token).map(|p| *p).unwrap_or(Price::ZERO))
        })
    }

    fn submit_order(&self, submission: OrderSubmission) -> BoxFuture<'_, LedgerResult<OrderId>> {
        Box::pin(async move {
            let id = OrderId::random();
            self.insert_order(OrderDetails {
                id,
                owner: Address::ZERO,
                token_in: submission.token_in,
                token_out: submission.token_out,
                amount_in: submission.amount_in,
                limit_price: None,
                expiry: None,
                status: OrderStatus::Pending,
                batch_id: BatchId::new(self.batch_id.load(Ordering::SeqCst)),
                submitted_at: chrono::Utc::now(),
            });
            Ok(id)
        })
    }

    fn submit_limit_order(
        &self,
        submission: LimitOrderSubmission,
    ) -> BoxFuture<'_, LedgerResult<OrderId>> {
        Box::pin(async move {
            let id = OrderId::random();
            self.insert_order(OrderDetails {
                id,
                owner: Address::ZERO,
                token_in: submission.token_in,
                token_out: submission.token_out,
                amount_in: submission.amount_in,
                limit_price: Some(submission.limit_price),
                expiry: submission.expiry,
                status: OrderStatus::Pending,
                batch_id: BatchId::new(self.batch_id.load(Ordering::SeqCst)),
                submitted_at: chrono::Utc::now(),
            });
            Ok(id)
        })
    }

    fn cancel_order(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<TxReceipt>> {
        Box::pin(async move {
            let mut entry = match self.orders.get_mut(&id) {
                Some(entry) => entry,
                None => return Err(LedgerError::UnknownOrder(id)),
            };
            if entry.status != OrderStatus::Pending {
                return Ok(self.reverted_receipt("cancel"));
            }
            entry.status = OrderStatus::Cancelled;
            drop(entry);
            self.pending.lock().retain(|pending_id| *pending_id != id);
            Ok(self.ok_receipt("cancel"))
        })
    }

    fn execute_limit_order(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<TxReceipt>> {
        Box::pin(async move {
            self.execution_attempts.fetch_add(1, Ordering::SeqCst);
            if self.revert_next_execution.swap(false, Ordering::SeqCst) {
                return Ok(self.reverted_receipt("execute"));
            }
            let mut entry = match self.orders.get_mut(&id) {
                Some(entry) => entry,
                None => return Err(LedgerError::UnknownOrder(id)),
            };
            let decision = self.decide(&entry);
            if !decision.can_execute {
                return Ok(self.reverted_receipt("execute"));
            }
            entry.status = OrderStatus::Executed;
            drop(entry);
            self.pending.lock().retain(|pending_id| *pending_id != id);
            self.executed.lock().push(id);
            Ok(self.ok_receipt("execute"))
        })
    }

    fn push_prices(
        &self,
        updates: Vec<(Address, Price)>,
    ) -> BoxFuture<'_, LedgerResult<TxReceipt>> {
        Box::pin(async move {
            for (token, price) in &updates {
                self.prices.insert(*token, *price);
            }
            self.pushes.lock().push(updates);
            Ok(self.ok_receipt("push"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use veil_core::Amount;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::new(bytes)
    }

    fn limit_order(id: u8, token: Address, target: rust_decimal::Decimal) -> OrderDetails {
        OrderDetails {
            id: OrderId::new([id; 32]),
            owner: addr(0xee),
            token_in: token,
            token_out: addr(0xdd),
            amount_in: Amount::new(dec!(10)),
            limit_price: Some(Price::new(target)),
            expiry: None,
            status: OrderStatus::Pending,
            batch_id: BatchId::new(1),
            submitted_at: Utc.timestamp_opt(1_800_000_000, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_execution_flips_status_and_decision() {
        let ledger = MemoryLedger::new();
        let token = addr(1);
        let order = limit_order(7, token, dec!(2000));
        let id = order.id;
        ledger.insert_order(order);
        ledger.set_price(token, Price::new(dec!(2050)));

        assert!(ledger.can_execute_limit_order(id).await.unwrap().can_execute);

        let receipt = ledger.execute_limit_order(id).await.unwrap();
        assert!(receipt.success);
        assert_eq!(ledger.order_status(id), Some(OrderStatus::Executed));
        assert_eq!(ledger.pending_order_count().await.unwrap(), 0);

        // Terminal state: the predicate goes quiet, re-execution reverts.
        assert!(!ledger.can_execute_limit_order(id).await.unwrap().can_execute);
        assert!(!ledger.execute_limit_order(id).await.unwrap().success);
        assert_eq!(ledger.executed_orders(), vec![id]);
    }

    #[tokio::test]
    async fn test_decision_below_target() {
        let ledger = MemoryLedger::new();
        let token = addr(1);
        let order = limit_order(7, token, dec!(2000));
        let id = order.id;
        ledger.insert_order(order);
        ledger.set_price(token, Price::new(dec!(1900)));

        let decision = ledger.can_execute_limit_order(id).await.unwrap();
        assert!(!decision.can_execute);
        assert_eq!(decision.current_price, Price::new(dec!(1900)));
        assert_eq!(decision.target_price, Price::new(dec!(2000)));
    }

    #[tokio::test]
    async fn test_injected_read_failure_fires_once() {
        let ledger = MemoryLedger::new();
        let order = limit_order(7, addr(1), dec!(2000));
        let id = order.id;
        ledger.insert_order(order);

        ledger.inject_read_failure();
        assert!(ledger.order_details(id).await.is_err());
        assert!(ledger.order_details(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_push_prices_recorded_and_readable() {
        let ledger = MemoryLedger::new();
        let token = addr(1);
        ledger
            .push_prices(vec![(token, Price::new(dec!(1999.5)))])
            .await
            .unwrap();

        assert_eq!(ledger.current_price(token).await.unwrap(), Price::new(dec!(1999.5)));
        assert_eq!(ledger.price_pushes().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_pending_order() {
        let ledger = MemoryLedger::new();
        let order = limit_order(7, addr(1), dec!(2000));
        let id = order.id;
        ledger.insert_order(order);

        assert!(ledger.cancel_order(id).await.unwrap().success);
        assert_eq!(ledger.order_status(id), Some(OrderStatus::Cancelled));
        // Cancelling again is a ledger-reported failure, not an error.
        assert!(!ledger.cancel_order(id).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_submissions_assign_ids() {
        let ledger = MemoryLedger::new();
        let id = ledger
            .submit_limit_order(LimitOrderSubmission {
                payload: b"ciphertext".to_vec(),
                dataset: addr(5),
                token_in: addr(1),
                token_out: addr(2),
                amount_in: Amount::new(dec!(10)),
                limit_price: Price::new(dec!(1500)),
                expiry: None,
            })
            .await
            .unwrap();

        let details = ledger.order_details(id).await.unwrap();
        assert_eq!(details.limit_price, Some(Price::new(dec!(1500))));
        assert_eq!(ledger.pending_order_count().await.unwrap(), 1);
    }
}
