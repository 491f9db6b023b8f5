//! The veil keeper: an autonomous execution scheduler.
//!
//! Two independently ticking loops run against the ledger:
//! - the price-sync loop mirrors external market prices on chain, gated so
//!   negligible ticks do not become transactions;
//! - the order-execution loop scans pending limit orders and fires each one
//!   exactly once when the ledger says its trigger price is reached.
//!
//! The keeper holds no durable state. Every tick re-derives its work from
//! ledger reads, so the process can be killed and restarted at any point
//! with no loss.

pub mod app;
pub mod config;
pub mod error;
pub mod feed;
pub mod gate;
pub mod order_watch;
pub mod price_sync;

pub use app::{Keeper, PRIVATE_KEY_ENV};
pub use config::{AssetPriceSource, KeeperConfig, TrackedAsset};
pub use error::{KeeperError, KeeperResult};
pub use feed::{CoinGeckoSource, FeedError, PriceSource, StaticPriceSource};
pub use gate::PriceGate;
pub use order_watch::{OrderWatcher, TickSummary};
pub use price_sync::{PriceSync, PushOutcome};
