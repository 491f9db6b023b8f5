//! Order-execution loop.
//!
//! Each tick re-derives the full work list from the ledger: enumerate the
//! pending order ids, evaluate each one sequentially, and submit an
//! execution the moment the ledger's own predicate says the trigger price
//! is reached. The loop keeps no memory between ticks; idempotence comes
//! from the ledger flipping an executed order out of Pending, after which
//! the predicate reports false.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};
use veil_core::OrderId;
use veil_ledger::DynLedger;

/// Counters for one order-loop tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Pending ids enumerated from the ledger.
    pub scanned: u64,
    /// Executions confirmed successful.
    pub executed: u32,
    /// Limit orders whose trigger price is not reached yet.
    pub not_ready: u32,
    /// Orders skipped: non-limit, no longer Pending, or expired by clock.
    pub skipped: u32,
    /// Submissions with unknown or reverted outcome, left for next tick.
    pub deferred: u32,
    /// Read or transport errors; the order is retried next tick.
    pub failed: u32,
}

/// Per-order outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OrderOutcome {
    Executed,
    NotReady,
    Skipped,
    Deferred,
    Failed,
}

pub struct OrderWatcher {
    ledger: DynLedger,
    confirm_timeout: Duration,
    interval: Duration,
}

impl OrderWatcher {
    pub fn new(ledger: DynLedger, confirm_timeout: Duration, interval: Duration) -> Self {
        Self {
            ledger,
            confirm_timeout,
            interval,
        }
    }

    /// Run forever. One order's failure never blocks the rest of the tick,
    /// and one tick's failure never blocks the next.
    pub async fn run(self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "order-execution loop started"
        );
        loop {
            let summary = self.tick(Utc::now()).await;
            trace!(?summary, "order tick complete");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass over all ledger-reported pending orders.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();

        let count = match self.ledger.pending_order_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "failed to read pending order count");
                summary.failed += 1;
                return summary;
            }
        };
        summary.scanned = count;
        if count == 0 {
            return summary;
        }
        debug!(pending = count, "scanning pending orders");

        for index in 0..count {
            let id = match self.ledger.pending_order_id_at(index).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(index, error = %e, "failed to read pending order id");
                    summary.failed += 1;
                    continue;
                }
            };
            match self.evaluate(id, now).await {
                OrderOutcome::Executed => summary.executed += 1,
                OrderOutcome::NotReady => summary.not_ready += 1,
                OrderOutcome::Skipped => summary.skipped += 1,
                OrderOutcome::Deferred => summary.deferred += 1,
                OrderOutcome::Failed => summary.failed += 1,
            }
        }

        if summary.executed > 0 {
            info!(
                executed = summary.executed,
                scanned = summary.scanned,
                "tick executed orders"
            );
        }
        summary
    }

    async fn evaluate(&self, id: OrderId, now: DateTime<Utc>) -> OrderOutcome {
        let details = match self.ledger.order_details(id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(order = %id.short(), error = %e, "failed to read order details");
                return OrderOutcome::Failed;
            }
        };

        // The pending enumeration and this read are not atomic; trust the
        // detail read. A terminal order is never touched again.
        if details.status.is_terminal() {
            debug!(order = %id.short(), status = %details.status, "order no longer pending");
            return OrderOutcome::Skipped;
        }
        if !details.is_limit() {
            debug!(order = %id.short(), "batch order, not ours to execute");
            return OrderOutcome::Skipped;
        }
        // Expired-but-still-Pending orders belong to the expiry sweep, not
        // to execution.
        if details.is_expired_at(now) {
            debug!(order = %id.short(), "order expired, awaiting sweep");
            return OrderOutcome::Skipped;
        }

        let decision = match self.ledger.can_execute_limit_order(id).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(order = %id.short(), error = %e, "execution predicate read failed");
                return OrderOutcome::Failed;
            }
        };
        if !decision.can_execute {
            debug!(
                order = %id.short(),
                current = %decision.current_price,
                target = %decision.target_price,
                "trigger price not reached"
            );
            return OrderOutcome::NotReady;
        }

        info!(
            order = %id.short(),
            current = %decision.current_price,
            target = %decision.target_price,
            "executing limit order"
        );
        match timeout(self.confirm_timeout, self.ledger.execute_limit_order(id)).await {
            Err(_) => {
                // Unknown outcome; the next tick reads ledger truth and
                // either finds the order Executed or retries.
                warn!(order = %id.short(), "execution confirmation timed out");
                OrderOutcome::Deferred
            }
            Ok(Err(e)) => {
                warn!(order = %id.short(), error = %e, "execution submission failed");
                OrderOutcome::Failed
            }
            Ok(Ok(receipt)) if receipt.success => {
                info!(order = %id.short(), tx = %receipt.tx_hash, "limit order executed");
                OrderOutcome::Executed
            }
            Ok(Ok(receipt)) => {
                warn!(
                    order = %id.short(),
                    tx = %receipt.tx_hash,
                    "execution reverted, order left pending"
                );
                OrderOutcome::Deferred
            }
        }
    }
}
