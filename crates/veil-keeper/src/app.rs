//! Keeper application wiring.
//!
//! Builds the signing ledger client and the price feed, runs preflight
//! checks, and supervises the two scheduler loops until shutdown.

use std::sync::Arc;

use tracing::{error, info, warn};
use veil_ledger::{DynLedger, Ledger, RpcLedger};

use crate::config::KeeperConfig;
use crate::error::{KeeperError, KeeperResult};
use crate::feed::CoinGeckoSource;
use crate::gate::PriceGate;
use crate::order_watch::OrderWatcher;
use crate::price_sync::PriceSync;

/// Environment variable holding the keeper's signing key.
pub const PRIVATE_KEY_ENV: &str = "KEEPER_PRIVATE_KEY";

pub struct Keeper {
    config: KeeperConfig,
    rpc: Arc<RpcLedger>,
}

impl Keeper {
    /// Validate configuration and build the signing client.
    ///
    /// A missing or invalid signing key is fatal here; the keeper never
    /// starts in a state where it cannot submit.
    pub fn new(config: KeeperConfig) -> KeeperResult<Self> {
        config.validate()?;

        let key = std::env::var(PRIVATE_KEY_ENV)
            .map_err(|_| KeeperError::Config(format!("{PRIVATE_KEY_ENV} is not set")))?;
        let rpc = Arc::new(RpcLedger::connect(
            &config.rpc_url,
            config.chain_id,
            config.pool_address,
            config.price_vault_address,
            &key,
        )?);

        info!(
            signer = %rpc.signer_address(),
            rpc_url = %config.rpc_url,
            pool = %config.pool_address,
            "keeper initialized"
        );
        Ok(Self { config, rpc })
    }

    /// Verify the ledger is reachable before entering the loops.
    pub async fn preflight(&self) -> KeeperResult<()> {
        let batch_id = self
            .rpc
            .current_batch_id()
            .await
            .map_err(|e| KeeperError::Preflight(format!("ledger unreachable: {e}")))?;

        let balance = self
            .rpc
            .signer_balance()
            .await
            .map_err(|e| KeeperError::Preflight(format!("balance read failed: {e}")))?;

        info!(%batch_id, %balance, "preflight passed");
        if balance < self.config.low_balance_warning {
            warn!(%balance, "signer balance is low, submissions may fail");
        }
        Ok(())
    }

    /// Spawn both loops and run until a shutdown signal.
    pub async fn run(self) -> KeeperResult<()> {
        let ledger: DynLedger = self.rpc.clone();
        let feed = Arc::new(CoinGeckoSource::new(self.config.feed_url.clone())?);

        let price_sync = PriceSync::new(
            ledger.clone(),
            feed,
            PriceGate::new(self.config.min_price_change_percent),
            self.config.assets.clone(),
            self.config.confirmation_timeout(),
            self.config.price_interval(),
        );
        let order_watch = OrderWatcher::new(
            ledger,
            self.config.confirmation_timeout(),
            self.config.order_interval(),
        );

        let mut price_handle = tokio::spawn(price_sync.run());
        let mut order_handle = tokio::spawn(order_watch.run());

        // The loops only end by panic; treat either one exiting as fatal.
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
            }
            result = &mut price_handle => {
                error!(?result, "price-sync loop exited unexpectedly");
            }
            result = &mut order_handle => {
                error!(?result, "order-execution loop exited unexpectedly");
            }
        }

        price_handle.abort();
        order_handle.abort();
        info!("keeper stopped");
        Ok(())
    }
}
