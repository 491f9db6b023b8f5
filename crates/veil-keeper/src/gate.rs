//! Price oracle gate.
//!
//! Decides whether an observed external price has moved enough since the
//! last on-chain push to justify another state-changing transaction. The
//! last-pushed values live here and nowhere else: initialized empty at
//! startup and updated only after a push has confirmed, so a failed push
//! is retried on the next observation.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;
use veil_core::Price;

#[derive(Debug)]
pub struct PriceGate {
    min_change_percent: Decimal,
    last_pushed: HashMap<String, Price>,
}

impl PriceGate {
    pub fn new(min_change_percent: Decimal) -> Self {
        Self {
            min_change_percent,
            last_pushed: HashMap::new(),
        }
    }

    /// True when a push is warranted: nothing was ever pushed for this
    /// feed, or the move since the last push meets the threshold.
    pub fn should_push(&self, feed_id: &str, observed: Price) -> bool {
        let last = match self.last_pushed.get(feed_id) {
            Some(last) => *last,
            None => return true,
        };
        match observed.pct_change_from(last) {
            Some(change) => {
                let push = change >= self.min_change_percent;
                debug!(
                    feed = feed_id,
                    %observed,
                    %last,
                    change_pct = %change,
                    push,
                    "gate decision"
                );
                push
            }
            // A zero last-push can only happen if a zero price was pushed;
            // treat any move off it as significant.
            None => true,
        }
    }

    /// Record a confirmed push. Call only after the ledger accepted it.
    pub fn record_push(&mut self, feed_id: &str, price: Price) {
        self.last_pushed.insert(feed_id.to_string(), price);
    }

    pub fn last_pushed(&self, feed_id: &str) -> Option<Price> {
        self.last_pushed.get(feed_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gate() -> PriceGate {
        PriceGate::new(dec!(0.5))
    }

    #[test]
    fn test_first_observation_always_pushes() {
        let gate = gate();
        assert!(gate.should_push("ethereum", Price::new(dec!(2000))));
    }

    #[test]
    fn test_unchanged_price_does_not_push() {
        let mut gate = gate();
        gate.record_push("ethereum", Price::new(dec!(2000)));
        assert!(!gate.should_push("ethereum", Price::new(dec!(2000))));
    }

    #[test]
    fn test_threshold_boundary() {
        let mut gate = gate();
        gate.record_push("ethereum", Price::new(dec!(2000)));

        // 0.5% of 2000 is 10: below stays quiet, at or above pushes.
        assert!(!gate.should_push("ethereum", Price::new(dec!(2009.99))));
        assert!(gate.should_push("ethereum", Price::new(dec!(2010))));
        assert!(gate.should_push("ethereum", Price::new(dec!(1990))));
    }

    #[test]
    fn test_feeds_gate_independently() {
        let mut gate = gate();
        gate.record_push("ethereum", Price::new(dec!(2000)));

        assert!(gate.should_push("bitcoin", Price::new(dec!(60000))));
        assert!(!gate.should_push("ethereum", Price::new(dec!(2001))));
    }

    #[test]
    fn test_record_push_updates_baseline() {
        let mut gate = gate();
        gate.record_push("ethereum", Price::new(dec!(2000)));
        gate.record_push("ethereum", Price::new(dec!(2100)));

        assert_eq!(gate.last_pushed("ethereum"), Some(Price::new(dec!(2100))));
        // 2110 is <0.5% from 2100 even though it is >5% from 2000.
        assert!(!gate.should_push("ethereum", Price::new(dec!(2110))));
    }
}
