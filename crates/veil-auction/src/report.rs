//! Batch processing pipeline and its output artifact.

use crate::error::RejectReason;
use crate::intake::RawOrder;
use crate::matcher::match_batch;
use crate::validator::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use veil_core::{ClearingResult, Order};

/// A refused order, identified by whatever id string the submitter carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedOrder {
    pub id: Option<String>,
    pub reason: String,
}

/// Settlement hand-off artifact for one processed batch.
///
/// This is what the enclave writes out for the settlement path: the
/// accepted order set, why the rest were refused, and the clearing results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub total_orders: usize,
    pub accepted: Vec<Order>,
    pub rejected: Vec<RejectedOrder>,
    pub clearings: Vec<ClearingResult>,
}

/// Run a full batch: validate every order, match the survivors.
///
/// Rejections accumulate in the report; they never interrupt the batch.
pub fn process_batch(raws: &[RawOrder], now: DateTime<Utc>) -> BatchReport {
    let mut accepted = Vec::with_capacity(raws.len());
    let mut rejected = Vec::new();

    for raw in raws {
        match validate(raw, now) {
            Ok(order) => accepted.push(order),
            Err(reason) => rejected.push(RejectedOrder {
                id: raw.id.clone(),
                reason: reason.to_string(),
            }),
        }
    }

    let clearings = match_batch(&accepted);
    info!(
        total = raws.len(),
        accepted = accepted.len(),
        rejected = rejected.len(),
        cleared_pairs = clearings.len(),
        "batch processed"
    );

    BatchReport {
        generated_at: now,
        total_orders: raws.len(),
        accepted,
        rejected,
        clearings,
    }
}

/// Rejected decrypt output, folded into the same report shape.
pub fn rejection_report(reason: &RejectReason, now: DateTime<Utc>) -> BatchReport {
    BatchReport {
        generated_at: now,
        total_orders: 1,
        accepted: Vec::new(),
        rejected: vec![RejectedOrder {
            id: None,
            reason: reason.to_string(),
        }],
        clearings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TOKEN_A: &str = "0x62b64cc9b1aa2f2c9d612f0b4a58cfba0eec9be2";
    const TOKEN_B: &str = "0xcc5f8fc3ccab02157f82afb7e19fc65f4808849e";

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_800_000_000, 0).unwrap()
    }

    fn raw(token_in: &str, token_out: &str, amount: &str) -> RawOrder {
        RawOrder {
            kind: Some("market".into()),
            token_in: Some(token_in.into()),
            token_out: Some(token_out.into()),
            amount_in: Some(amount.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_bad_order_does_not_poison_batch() {
        let mut bad = raw(TOKEN_A, TOKEN_B, "100");
        bad.amount_in = Some("-1".into());

        let report = process_batch(
            &[raw(TOKEN_A, TOKEN_B, "100"), bad, raw(TOKEN_B, TOKEN_A, "50")],
            now(),
        );

        assert_eq!(report.total_orders, 3);
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        // The two good orders still cleared against each other.
        assert_eq!(report.clearings.len(), 1);
        assert_eq!(report.clearings[0].clearing_price.inner().to_string(), "0.5");
    }

    #[test]
    fn test_rejection_carries_submitted_id() {
        let mut bad = raw(TOKEN_A, TOKEN_A, "100");
        bad.id = Some("order-7".into());

        let report = process_batch(&[bad], now());
        assert_eq!(report.rejected[0].id.as_deref(), Some("order-7"));
        assert!(report.rejected[0].reason.contains("same asset"));
    }

    #[test]
    fn test_report_serializes() {
        let report = process_batch(&[raw(TOKEN_A, TOKEN_B, "10")], now());
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"total_orders\": 1"));
        assert!(json.contains("\"clearings\""));
    }
}
