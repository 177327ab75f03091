//! Ledger access: wallet session, payment and asset-creation calls.
//!
//! The crate never builds or signs ledger transactions. [`RpcLedger`] hands
//! requests to a signing gateway over JSON-RPC and polls until they are
//! confirmed. [`SimulatedLedger`] keeps everything in memory for offline
//! sessions.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MetroConfig;
use crate::constants::{MAX_ASSET_NAME_LEN, MAX_DECIMALS, MAX_UNIT_NAME_LEN};
use crate::error::{MetroError, Result, WalletIssue};

/// Longest asset URL the ledger accepts, in bytes.
const MAX_ASSET_URL_LEN: usize = 96;

// ── Wallet ──────────────────────────────────────────────────────

/// Signing capability exposed by the wallet provider. The gateway resolves
/// the label to the actual key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerHandle {
    label: String,
}

impl SignerHandle {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// What the wallet provider currently exposes.
#[derive(Clone, Debug, Default)]
pub struct WalletSession {
    address: Option<String>,
    signer: Option<SignerHandle>,
}

impl WalletSession {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(address: impl Into<String>, signer: SignerHandle) -> Self {
        Self {
            address: Some(address.into()),
            signer: Some(signer),
        }
    }

    /// An address with no signer, e.g. a wallet that lost its session.
    pub fn watch_only(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            signer: None,
        }
    }

    pub fn from_config(config: &MetroConfig) -> Self {
        Self {
            address: config.wallet_address.clone(),
            signer: config.signer.clone().map(SignerHandle::new),
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().filter(|a| !a.is_empty())
    }

    /// Address and signer, or the reason a ledger call cannot be made.
    pub fn require(&self) -> Result<ActiveWallet<'_>> {
        let address = self
            .address()
            .ok_or(MetroError::WalletUnavailable(WalletIssue::NotConnected))?;
        let signer = self
            .signer
            .as_ref()
            .ok_or(MetroError::WalletUnavailable(WalletIssue::NoSigner))?;
        Ok(ActiveWallet { address, signer })
    }
}

/// A wallet that can sign, borrowed for the duration of a ledger call.
#[derive(Clone, Copy, Debug)]
pub struct ActiveWallet<'a> {
    pub address: &'a str,
    pub signer: &'a SignerHandle,
}

// ── Requests and receipts ───────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    pub sender: String,
    pub receiver: String,
    /// Amount in micro-units of the native currency.
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetCreateRequest {
    pub sender: String,
    /// Total base units, i.e. supply × 10^decimals.
    pub total: u64,
    pub decimals: u32,
    pub asset_name: String,
    pub unit_name: String,
    pub url: Option<String>,
    pub metadata_hash: Option<[u8; 32]>,
    pub default_frozen: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub tx_id: String,
    pub confirmed_round: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReceipt {
    pub asset_id: u64,
    pub tx_id: String,
    pub confirmed_round: u64,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Submit a payment and wait until it is confirmed.
    async fn send_payment(
        &self,
        wallet: &ActiveWallet<'_>,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt>;

    /// Create an asset and wait until it is confirmed.
    async fn create_asset(
        &self,
        wallet: &ActiveWallet<'_>,
        request: &AssetCreateRequest,
    ) -> Result<AssetReceipt>;
}

fn ensure_sender(wallet: &ActiveWallet<'_>, sender: &str) -> Result<()> {
    if wallet.address != sender {
        return Err(MetroError::LedgerCallFailed(format!(
            "sender {} is not the active wallet",
            sender
        )));
    }
    Ok(())
}

// ── JSON-RPC gateway ────────────────────────────────────────────

#[derive(Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
}

/// Ledger reached through a JSON-RPC signing gateway.
pub struct RpcLedger {
    client: reqwest::Client,
    rpc_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl RpcLedger {
    pub fn new(client: reqwest::Client, rpc_url: impl Into<String>) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
            poll_interval: Duration::from_millis(500),
            max_polls: 20,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &MetroConfig) -> Self {
        Self::new(client, config.ledger_rpc_url.clone()).with_confirmation(
            Duration::from_millis(config.confirmation_poll_ms),
            config.max_confirmation_polls,
        )
    }

    pub fn with_confirmation(mut self, poll_interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_polls = max_polls.max(1);
        self
    }

    /// Gateway version string; used as a connectivity check.
    pub async fn check_rpc(&self) -> Result<String> {
        let version = self.call("getVersion", serde_json::json!([])).await?;
        Ok(version["version"]
            .as_str()
            .unwrap_or("unknown")
            .to_string())
    }

    async fn call(&self, method: &'static str, params: serde_json::Value) -> Result<serde_json::Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let resp: RpcResponse = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MetroError::LedgerCallFailed(format!("{method}: {e}")))?
            .json()
            .await
            .map_err(|e| MetroError::LedgerCallFailed(format!("{method}: {e}")))?;

        if let Some(err) = resp.error {
            return Err(MetroError::LedgerCallFailed(format!("RPC error: {}", err)));
        }
        Ok(resp.result.unwrap_or_default())
    }

    async fn submit(&self, method: &'static str, params: serde_json::Value) -> Result<String> {
        let result = self.call(method, params).await?;
        result["txId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MetroError::LedgerCallFailed(format!("{method}: missing txId")))
    }

    /// Poll `pendingTransactionInfo` until the transaction lands in a round
    /// or the gateway reports it rejected.
    async fn wait_for_confirmation(&self, tx_id: &str) -> Result<serde_json::Value> {
        for poll in 0..self.max_polls {
            let pending = self
                .call("pendingTransactionInfo", serde_json::json!([tx_id]))
                .await?;

            if let Some(pool_error) = pending["pool-error"].as_str() {
                if !pool_error.is_empty() {
                    return Err(MetroError::LedgerCallFailed(format!(
                        "transaction {tx_id} rejected: {pool_error}"
                    )));
                }
            }
            if pending["confirmed-round"].as_u64().unwrap_or(0) > 0 {
                return Ok(pending);
            }

            debug!("{} pending (poll {})", tx_id, poll + 1);
            tokio::time::sleep(self.poll_interval).await;
        }

        warn!("{} not confirmed after {} polls", tx_id, self.max_polls);
        Err(MetroError::LedgerCallFailed(format!(
            "transaction {tx_id} not confirmed after {} polls",
            self.max_polls
        )))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn send_payment(
        &self,
        wallet: &ActiveWallet<'_>,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt> {
        ensure_sender(wallet, &request.sender)?;
        let tx_id = self
            .submit(
                "sendPayment",
                serde_json::json!([{
                    "sender": request.sender,
                    "receiver": request.receiver,
                    "amount": request.amount,
                    "signer": wallet.signer.label(),
                }]),
            )
            .await?;

        let info = self.wait_for_confirmation(&tx_id).await?;
        let confirmed_round = info["confirmed-round"].as_u64().unwrap_or_default();
        info!("Payment {} confirmed in round {}", tx_id, confirmed_round);
        Ok(PaymentReceipt {
            tx_id,
            confirmed_round,
        })
    }

    async fn create_asset(
        &self,
        wallet: &ActiveWallet<'_>,
        request: &AssetCreateRequest,
    ) -> Result<AssetReceipt> {
        ensure_sender(wallet, &request.sender)?;
        let tx_id = self
            .submit(
                "createAsset",
                serde_json::json!([{
                    "sender": request.sender,
                    "total": request.total,
                    "decimals": request.decimals,
                    "assetName": request.asset_name,
                    "unitName": request.unit_name,
                    "url": request.url,
                    "metadataHash": request.metadata_hash.map(|h| BASE64.encode(h)),
                    "defaultFrozen": request.default_frozen,
                    "signer": wallet.signer.label(),
                }]),
            )
            .await?;

        let info = self.wait_for_confirmation(&tx_id).await?;
        let asset_id = info["asset-index"].as_u64().ok_or_else(|| {
            MetroError::LedgerCallFailed(format!("transaction {tx_id} created no asset"))
        })?;
        let confirmed_round = info["confirmed-round"].as_u64().unwrap_or_default();
        info!("Asset {} created by {} in round {}", asset_id, tx_id, confirmed_round);
        Ok(AssetReceipt {
            asset_id,
            tx_id,
            confirmed_round,
        })
    }
}

// ── In-memory ledger ────────────────────────────────────────────

#[derive(Debug)]
struct SimState {
    round: u64,
    next_asset_id: u64,
    payments: Vec<PaymentRequest>,
    assets: Vec<(u64, AssetCreateRequest)>,
}

/// In-memory ledger: every valid call confirms in the next round.
#[derive(Debug)]
pub struct SimulatedLedger {
    state: Mutex<SimState>,
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                round: 1,
                next_asset_id: 1_000,
                payments: Vec::new(),
                assets: Vec::new(),
            }),
        }
    }

    pub fn payments(&self) -> Vec<PaymentRequest> {
        self.state
            .lock()
            .map(|s| s.payments.clone())
            .unwrap_or_default()
    }

    pub fn assets(&self) -> Vec<(u64, AssetCreateRequest)> {
        self.state
            .lock()
            .map(|s| s.assets.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SimState>> {
        self.state
            .lock()
            .map_err(|_| MetroError::LedgerCallFailed("simulated ledger poisoned".to_string()))
    }
}

fn check_asset_params(request: &AssetCreateRequest) -> Result<()> {
    let reject = |msg: String| Err(MetroError::LedgerCallFailed(msg));
    if request.total == 0 {
        return reject("asset total must be positive".to_string());
    }
    if request.decimals > MAX_DECIMALS {
        return reject(format!("decimals {} exceed {}", request.decimals, MAX_DECIMALS));
    }
    if request.asset_name.len() > MAX_ASSET_NAME_LEN {
        return reject(format!("asset name longer than {MAX_ASSET_NAME_LEN} bytes"));
    }
    if request.unit_name.len() > MAX_UNIT_NAME_LEN {
        return reject(format!("unit name longer than {MAX_UNIT_NAME_LEN} bytes"));
    }
    if request.url.as_ref().is_some_and(|u| u.len() > MAX_ASSET_URL_LEN) {
        return reject(format!("asset url longer than {MAX_ASSET_URL_LEN} bytes"));
    }
    Ok(())
}

#[async_trait]
impl Ledger for SimulatedLedger {
    async fn send_payment(
        &self,
        wallet: &ActiveWallet<'_>,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt> {
        ensure_sender(wallet, &request.sender)?;
        let mut state = self.lock()?;
        state.round += 1;
        state.payments.push(request.clone());
        let tx_id = format!("SIMPAY{:06}", state.payments.len());
        debug!("Simulated payment {} of {} to {}", tx_id, request.amount, request.receiver);
        Ok(PaymentReceipt {
            tx_id,
            confirmed_round: state.round,
        })
    }

    async fn create_asset(
        &self,
        wallet: &ActiveWallet<'_>,
        request: &AssetCreateRequest,
    ) -> Result<AssetReceipt> {
        ensure_sender(wallet, &request.sender)?;
        check_asset_params(request)?;
        let mut state = self.lock()?;
        state.round += 1;
        let asset_id = state.next_asset_id;
        state.next_asset_id += 1;
        state.assets.push((asset_id, request.clone()));
        let tx_id = format!("SIMACFG{:06}", state.assets.len());
        debug!("Simulated asset {} ({})", asset_id, request.asset_name);
        Ok(AssetReceipt {
            asset_id,
            tx_id,
            confirmed_round: state.round,
        })
    }
}
