//! Price-sync loop.
//!
//! Mirrors external market prices into the on-chain price vault. Each tick
//! fetches fresh quotes, asks the gate whether any feed moved enough, and
//! on a positive decision submits a single push covering every configured
//! token. The push is awaited to confirmation (bounded by the timeout)
//! before the loop proceeds, keeping this identity's transactions ordered.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, trace, warn};
use veil_core::{Address, Price};
use veil_ledger::DynLedger;

use crate::config::{AssetPriceSource, TrackedAsset};
use crate::feed::PriceSource;
use crate::gate::PriceGate;

/// What one price-sync tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Prices confirmed on chain; gate baselines updated.
    Pushed { tokens: usize },
    /// No feed moved past the threshold; nothing submitted.
    Skipped,
    /// Every feed fetch failed this tick; retry on the next one.
    FeedUnavailable,
    /// Submission failed, reverted, or timed out; the gate keeps its old
    /// baseline so the next observation retries.
    Deferred(String),
}

pub struct PriceSync {
    ledger: DynLedger,
    feed: Arc<dyn PriceSource>,
    gate: PriceGate,
    assets: Vec<TrackedAsset>,
    confirm_timeout: Duration,
    interval: Duration,
}

impl PriceSync {
    pub fn new(
        ledger: DynLedger,
        feed: Arc<dyn PriceSource>,
        gate: PriceGate,
        assets: Vec<TrackedAsset>,
        confirm_timeout: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            ledger,
            feed,
            gate,
            assets,
            confirm_timeout,
            interval,
        }
    }

    /// Run forever. Tick failures never escalate; the next tick retries.
    pub async fn run(mut self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            assets = self.assets.len(),
            "price-sync loop started"
        );
        loop {
            let outcome = self.tick().await;
            trace!(?outcome, "price tick complete");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass: observe, gate, push, record.
    pub async fn tick(&mut self) -> PushOutcome {
        // Observe every feed-driven asset. A failed quote is tolerated;
        // the asset just sits this tick out.
        let mut observations: Vec<(String, Price)> = Vec::new();
        let mut feed_count = 0usize;
        for asset in &self.assets {
            let AssetPriceSource::Feed { id } = &asset.source else {
                continue;
            };
            feed_count += 1;
            if observations.iter().any(|(seen, _)| seen == id) {
                continue;
            }
            match self.feed.spot_price(id).await {
                Ok(price) if price.is_positive() => observations.push((id.clone(), price)),
                Ok(price) => warn!(feed = %id, %price, "discarding non-positive quote"),
                Err(e) => warn!(feed = %id, error = %e, "quote fetch failed"),
            }
        }
        if feed_count > 0 && observations.is_empty() {
            return PushOutcome::FeedUnavailable;
        }

        let triggered = observations
            .iter()
            .any(|(id, price)| self.gate.should_push(id, *price));
        if !triggered {
            debug!("no feed moved past the threshold");
            return PushOutcome::Skipped;
        }

        // One transaction covers the full token set: freshly observed feeds
        // plus the fixed-price tokens. Feeds without a quote this tick are
        // left out rather than pushed stale.
        let mut updates: Vec<(Address, Price)> = Vec::new();
        for asset in &self.assets {
            let price = match &asset.source {
                AssetPriceSource::Fixed { price } => *price,
                AssetPriceSource::Feed { id } => {
                    match observations.iter().find(|(seen, _)| seen == id) {
                        Some((_, price)) => *price,
                        None => continue,
                    }
                }
            };
            for token in &asset.tokens {
                updates.push((*token, price));
            }
        }

        let token_count = updates.len();
        match timeout(self.confirm_timeout, self.ledger.push_prices(updates)).await {
            Err(_) => {
                warn!("price push confirmation timed out, outcome unknown");
                PushOutcome::Deferred("confirmation timeout".into())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "price push failed");
                PushOutcome::Deferred(e.to_string())
            }
            Ok(Ok(receipt)) if !receipt.success => {
                warn!(tx = %receipt.tx_hash, "price push reverted");
                PushOutcome::Deferred(format!("reverted: {}", receipt.tx_hash))
            }
            Ok(Ok(receipt)) => {
                for (id, price) in &observations {
                    self.gate.record_push(id, *price);
                }
                info!(
                    tx = %receipt.tx_hash,
                    tokens = token_count,
                    "prices pushed on chain"
                );
                PushOutcome::Pushed { tokens: token_count }
            }
        }
    }

    pub fn gate(&self) -> &PriceGate {
        &self.gate
    }
}
