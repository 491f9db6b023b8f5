//! JSON-RPC ledger implementation with a signing wallet.
//!
//! Contract bindings are generated from the pool and price-vault ABIs. All
//! chain-side fixed-point values use 18 decimals; conversion to and from
//! `Decimal` happens exclusively at this boundary.

use std::sync::Arc;
use std::time::Duration;

use ethers::contract::{abigen, EthEvent};
use ethers::core::types::{Address as EthAddress, TransactionReceipt, U256};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::utils::{format_units, parse_units};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zeroize::Zeroizing;

use chrono::{DateTime, TimeZone, Utc};
use veil_core::{Address, Amount, BatchId, OrderId, OrderStatus, Price};

use crate::client::{BoxFuture, Ledger};
use crate::error::{LedgerError, LedgerResult};
use crate::types::{
    ExecutionDecision, LimitOrderSubmission, OrderDetails, OrderSubmission, TxReceipt,
};

abigen!(
    DarkPool,
    r#"[
        function currentBatchId() external view returns (uint256)
        function getPendingOrderCount() external view returns (uint256)
        function pendingOrderIds(uint256) external view returns (bytes32)
        function getOrderDetails(bytes32) external view returns (address, address, address, uint256, uint256, uint256, uint8, uint256, uint256)
        function canExecuteLimitOrder(bytes32) external view returns (bool, uint256, uint256)
        function submitOrder(bytes, address, address, address, uint256) external returns (bytes32)
        function submitLimitOrder(bytes, address, address, address, uint256, uint256, uint256) external returns (bytes32)
        function cancelOrder(bytes32) external
        function executeLimitOrder(bytes32) external returns (bool)
        event OrderSubmitted(bytes32 indexed orderId, address indexed owner)
    ]"#
);

abigen!(
    PriceVault,
    r#"[
        function setPrices(address[], uint256[]) external
        function getPrice(address) external view returns (uint256)
    ]"#
);

/// Chain-side fixed-point scale for amounts and prices.
const CHAIN_DECIMALS: u32 = 18;

/// Receipt polling interval for submitted transactions.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

type RpcClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Ledger over JSON-RPC with one signing identity.
///
/// `write_lock` is held across every submit-and-confirm sequence, so the
/// price-sync and order-execution loops can never interleave transactions
/// from the shared account.
pub struct RpcLedger {
    pool: DarkPool<RpcClient>,
    price_vault: PriceVault<RpcClient>,
    client: Arc<RpcClient>,
    signer: EthAddress,
    write_lock: Mutex<()>,
}

impl RpcLedger {
    /// Connect to the chain and bind both contracts.
    ///
    /// The private key string may carry a `0x` prefix and surrounding
    /// whitespace; decoded bytes are zeroized after the wallet takes over.
    pub fn connect(
        rpc_url: &str,
        chain_id: u64,
        pool_address: Address,
        price_vault_address: Address,
        private_key: &str,
    ) -> LedgerResult<Self> {
        let key_bytes = Zeroizing::new(
            hex::decode(private_key.trim().trim_start_matches("0x"))
                .map_err(|e| LedgerError::InvalidKey(format!("not hex: {e}")))?,
        );
        let wallet = LocalWallet::from_bytes(&key_bytes)
            .map_err(|e| LedgerError::InvalidKey(e.to_string()))?
            .with_chain_id(chain_id);
        let signer = wallet.address();

        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| LedgerError::Rpc(format!("bad endpoint {rpc_url}: {e}")))?
            .interval(POLL_INTERVAL);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        info!(signer = %signer, chain_id, "ledger client connected");

        Ok(Self {
            pool: DarkPool::new(to_eth_address(pool_address), client.clone()),
            price_vault: PriceVault::new(to_eth_address(price_vault_address), client.clone()),
            client,
            signer,
            write_lock: Mutex::new(()),
        })
    }

    /// Signing identity bound to this ledger handle.
    pub fn signer_address(&self) -> Address {
        Address::new(self.signer.0)
    }

    /// Native-token balance of the signing account, in whole units.
    pub async fn signer_balance(&self) -> LedgerResult<Decimal> {
        let wei = self
            .client
            .get_balance(self.signer, None)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;
        u256_to_decimal(wei)
    }

    async fn confirm(
        &self,
        pending: ethers::providers::PendingTransaction<'_, Http>,
    ) -> LedgerResult<TransactionReceipt> {
        let tx_hash = *pending;
        pending
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?
            .ok_or_else(|| LedgerError::ReceiptMissing(format!("{tx_hash:?}")))
    }
}

impl Ledger for RpcLedger {
    fn current_batch_id(&self) -> BoxFuture<'_, LedgerResult<BatchId>> {
        Box::pin(async move {
            let id = self
                .pool
                .current_batch_id()
                .call()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            Ok(BatchId::new(u256_to_u64(id)?))
        })
    }

    fn pending_order_count(&self) -> BoxFuture<'_, LedgerResult<u64>> {
        Box::pin(async move {
            let count = self
                .pool
                .get_pending_order_count()
                .call()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            u256_to_u64(count)
        })
    }

    fn pending_order_id_at(&self, index: u64) -> BoxFuture<'_, LedgerResult<OrderId>> {
        Box::pin(async move {
            let raw = self
                .pool
                .pending_order_ids(U256::from(index))
                .call()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            Ok(OrderId::new(raw))
        })
    }

    fn order_details(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<OrderDetails>> {
        Box::pin(async move {
            let (owner, token_in, token_out, amount_in, limit_price, expiry, status, batch_id, ts) =
                self.pool
                    .get_order_details(id.0)
                    .call()
                    .await
                    .map_err(|e| LedgerError::Call(e.to_string()))?;

            Ok(OrderDetails {
                id,
                owner: from_eth_address(owner),
                token_in: from_eth_address(token_in),
                token_out: from_eth_address(token_out),
                amount_in: Amount::new(u256_to_decimal(amount_in)?),
                limit_price: if limit_price.is_zero() {
                    None
                } else {
                    Some(Price::new(u256_to_decimal(limit_price)?))
                },
                expiry: if expiry.is_zero() {
                    None
                } else {
                    Some(u256_to_datetime(expiry)?)
                },
                status: OrderStatus::from_u8(status)?,
                batch_id: BatchId::new(u256_to_u64(batch_id)?),
                submitted_at: u256_to_datetime(ts)?,
            })
        })
    }

    fn can_execute_limit_order(
        &self,
        id: OrderId,
    ) -> BoxFuture<'_, LedgerResult<ExecutionDecision>> {
        Box::pin(async move {
            let (can_execute, current, target) = self
                .pool
                .can_execute_limit_order(id.0)
                .call()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            Ok(ExecutionDecision {
                can_execute,
                current_price: Price::new(u256_to_decimal(current)?),
                target_price: Price::new(u256_to_decimal(target)?),
            })
        })
    }

    fn current_price(&self, token: Address) -> BoxFuture<'_, LedgerResult<Price>> {
        Box::pin(async move {
            let raw = self
                .price_vault
                .get_price(to_eth_address(token))
                .call()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            Ok(Price::new(u256_to_decimal(raw)?))
        })
    }

    fn submit_order(&self, submission: OrderSubmission) -> BoxFuture<'_, LedgerResult<OrderId>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let call = self.pool.submit_order(
                submission.payload.into(),
                to_eth_address(submission.dataset),
                to_eth_address(submission.token_in),
                to_eth_address(submission.token_out),
                decimal_to_u256(submission.amount_in.inner())?,
            );
            let pending = call
                .send()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            let receipt = self.confirm(pending).await?;
            submitted_order_id(&receipt)
        })
    }

    fn submit_limit_order(
        &self,
        submission: LimitOrderSubmission,
    ) -> BoxFuture<'_, LedgerResult<OrderId>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let expiry = submission
                .expiry
                .map(|t| U256::from(t.timestamp().max(0) as u64))
                .unwrap_or_default();
            let call = self.pool.submit_limit_order(
                submission.payload.into(),
                to_eth_address(submission.dataset),
                to_eth_address(submission.token_in),
                to_eth_address(submission.token_out),
                decimal_to_u256(submission.amount_in.inner())?,
                decimal_to_u256(submission.limit_price.inner())?,
                expiry,
            );
            let pending = call
                .send()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            let receipt = self.confirm(pending).await?;
            submitted_order_id(&receipt)
        })
    }

    fn cancel_order(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<TxReceipt>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let call = self.pool.cancel_order(id.0);
            let pending = call
                .send()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            let receipt = self.confirm(pending).await?;
            debug!(order = %id.short(), tx = %receipt.transaction_hash, "cancel confirmed");
            Ok(receipt_from(&receipt))
        })
    }

    fn execute_limit_order(&self, id: OrderId) -> BoxFuture<'_, LedgerResult<TxReceipt>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let call = self.pool.execute_limit_order(id.0);
            let pending = call
                .send()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            let receipt = self.confirm(pending).await?;
            debug!(order = %id.short(), tx = %receipt.transaction_hash, "execution confirmed");
            Ok(receipt_from(&receipt))
        })
    }

    fn push_prices(
        &self,
        updates: Vec<(Address, Price)>,
    ) -> BoxFuture<'_, LedgerResult<TxReceipt>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut tokens = Vec::with_capacity(updates.len());
            let mut prices = Vec::with_capacity(updates.len());
            for (token, price) in updates {
                tokens.push(to_eth_address(token));
                prices.push(decimal_to_u256(price.inner())?);
            }
            let count = tokens.len();
            let call = self.price_vault.set_prices(tokens, prices);
            let pending = call
                .send()
                .await
                .map_err(|e| LedgerError::Call(e.to_string()))?;
            let receipt = self.confirm(pending).await?;
            debug!(tokens = count, tx = %receipt.transaction_hash, "price push confirmed");
            Ok(receipt_from(&receipt))
        })
    }
}

// ---------------------------------------------------------------------------
// Boundary conversions
// ---------------------------------------------------------------------------

fn to_eth_address(address: Address) -> EthAddress {
    EthAddress::from(*address.as_bytes())
}

fn from_eth_address(address: EthAddress) -> Address {
    Address::new(address.0)
}

fn u256_to_u64(value: U256) -> LedgerResult<u64> {
    if value > U256::from(u64::MAX) {
        return Err(LedgerError::Codec(format!("value out of u64 range: {value}")));
    }
    Ok(value.low_u64())
}

fn u256_to_decimal(value: U256) -> LedgerResult<Decimal> {
    let formatted = format_units(value, CHAIN_DECIMALS)
        .map_err(|e| LedgerError::Codec(e.to_string()))?;
    formatted
        .parse()
        .map_err(|e| LedgerError::Codec(format!("{formatted}: {e}")))
}

fn decimal_to_u256(value: Decimal) -> LedgerResult<U256> {
    if value.is_sign_negative() {
        return Err(LedgerError::Codec(format!("negative chain value: {value}")));
    }
    let parsed = parse_units(value.to_string(), CHAIN_DECIMALS)
        .map_err(|e| LedgerError::Codec(format!("{value}: {e}")))?;
    Ok(parsed.into())
}

fn u256_to_datetime(value: U256) -> LedgerResult<DateTime<Utc>> {
    let secs = u256_to_u64(value)?;
    Utc.timestamp_opt(secs as i64, 0)
        .single()
        .ok_or_else(|| LedgerError::Codec(format!("timestamp out of range: {secs}")))
}

fn receipt_from(receipt: &TransactionReceipt) -> TxReceipt {
    TxReceipt {
        tx_hash: format!("{:?}", receipt.transaction_hash),
        success: receipt.status.map(|s| s.low_u64() == 1).unwrap_or(false),
        block_number: receipt.block_number.map(|n| n.as_u64()),
    }
}

/// Pull the assigned order id out of the submission receipt's event log.
fn submitted_order_id(receipt: &TransactionReceipt) -> LedgerResult<OrderId> {
    if receipt.status.map(|s| s.is_zero()).unwrap_or(true) {
        return Err(LedgerError::Call(format!(
            "order submission reverted: {:?}",
            receipt.transaction_hash
        )));
    }
    receipt
        .logs
        .iter()
        .find_map(|log| {
            (log.topics.first() == Some(&OrderSubmittedFilter::signature())
                && log.topics.len() >= 2)
                .then(|| OrderId::new(log.topics[1].0))
        })
        .ok_or_else(|| {
            LedgerError::Codec(format!(
                "OrderSubmitted event missing from receipt {:?}",
                receipt.transaction_hash
            ))
        })
}
