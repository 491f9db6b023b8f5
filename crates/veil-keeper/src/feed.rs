//! External spot-price source.
//!
//! Quotes are best-effort and possibly stale; callers tolerate a failed
//! fetch by retrying on their next tick, never by stopping the loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use veil_core::Price;
use veil_ledger::BoxFuture;

#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Malformed quote response: {0}")]
    Malformed(String),

    #[error("No quote for asset: {0}")]
    MissingQuote(String),
}

/// Source of external market prices, keyed by the feed's asset id.
pub trait PriceSource: Send + Sync {
    fn spot_price<'a>(&'a self, asset_id: &'a str) -> BoxFuture<'a, Result<Price, FeedError>>;
}

/// Default timeout for quote requests.
const FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// CoinGecko simple-price client.
pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .map_err(|e| FeedError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl PriceSource for CoinGeckoSource {
    fn spot_price<'a>(&'a self, asset_id: &'a str) -> BoxFuture<'a, Result<Price, FeedError>> {
        Box::pin(async move {
            let url = format!(
                "{}/simple/price?ids={}&vs_currencies=usd",
                self.base_url, asset_id
            );
            debug!(%url, "fetching spot price");

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| FeedError::Http(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FeedError::Http(format!("HTTP {status}")));
            }

            // {"ethereum": {"usd": 3412.07}}
            let body: HashMap<String, HashMap<String, Decimal>> = response
                .json()
                .await
                .map_err(|e| FeedError::Malformed(e.to_string()))?;

            body.get(asset_id)
                .and_then(|quotes| quotes.get("usd"))
                .map(|usd| Price::new(*usd))
                .ok_or_else(|| FeedError::MissingQuote(asset_id.to_string()))
        })
    }
}

/// Scripted price source for tests.
#[derive(Default)]
pub struct StaticPriceSource {
    quotes: Mutex<HashMap<String, Price>>,
    fail_next: AtomicBool,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quote(&self, asset_id: &str, price: Price) {
        self.quotes.lock().insert(asset_id.to_string(), price);
    }

    /// Make the next fetch fail with a transport error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl PriceSource for StaticPriceSource {
    fn spot_price<'a>(&'a self, asset_id: &'a str) -> BoxFuture<'a, Result<Price, FeedError>> {
        Box::pin(async move {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(FeedError::Http("injected feed outage".into()));
            }
            self.quotes
                .lock()
                .get(asset_id)
                .copied()
                .ok_or_else(|| FeedError::MissingQuote(asset_id.to_string()))
        })
    }
}
