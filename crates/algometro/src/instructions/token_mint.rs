//! Fungible token issuance from the mint form.

use tracing::{error, info};

use crate::constants::{MAX_ASSET_NAME_LEN, MAX_DECIMALS, MAX_UNIT_NAME_LEN};
use crate::error::{MetroError, Result};
use crate::events::{Notification, NotificationSink};
use crate::ledger::{AssetCreateRequest, AssetReceipt, Ledger, WalletSession};

/// Form fields exactly as entered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenMintForm {
    pub asset_name: String,
    pub unit_name: String,
    pub total_supply: String,
    pub decimals: String,
}

/// Validated mint parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMintParams {
    pub asset_name: String,
    pub unit_name: String,
    pub supply: u64,
    pub decimals: u32,
    /// `supply × 10^decimals`, the base-unit total recorded on the ledger.
    pub on_chain_total: u64,
}

impl TokenMintForm {
    pub fn validate(&self) -> Result<TokenMintParams> {
        let asset_name = self.asset_name.trim();
        if asset_name.is_empty() {
            return Err(invalid("please enter an asset name"));
        }
        if asset_name.chars().count() > MAX_ASSET_NAME_LEN {
            return Err(invalid(format!(
                "asset name must be at most {MAX_ASSET_NAME_LEN} characters"
            )));
        }

        let unit_name = self.unit_name.trim();
        if unit_name.is_empty() {
            return Err(invalid("please enter a unit name"));
        }
        if unit_name.chars().count() > MAX_UNIT_NAME_LEN {
            return Err(invalid(format!(
                "unit name must be at most {MAX_UNIT_NAME_LEN} characters"
            )));
        }

        let supply = self
            .total_supply
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| invalid("please enter a valid total supply"))?;

        let decimals_raw = self.decimals.trim();
        let decimals = if decimals_raw.is_empty() {
            0
        } else {
            decimals_raw
                .parse::<u32>()
                .ok()
                .filter(|d| *d <= MAX_DECIMALS)
                .ok_or_else(|| invalid(format!("decimals must be between 0 and {MAX_DECIMALS}")))?
        };

        Ok(TokenMintParams {
            asset_name: asset_name.to_string(),
            unit_name: unit_name.to_string(),
            supply,
            decimals,
            on_chain_total: on_chain_total(supply, decimals)?,
        })
    }
}

/// `supply × 10^decimals`; overflow of the 64-bit ledger total is invalid input.
pub fn on_chain_total(supply: u64, decimals: u32) -> Result<u64> {
    10u64
        .checked_pow(decimals)
        .and_then(|scale| supply.checked_mul(scale))
        .ok_or_else(|| invalid("total supply is too large for the chosen decimals"))
}

fn invalid(msg: impl Into<String>) -> MetroError {
    MetroError::InvalidInput(msg.into())
}

/// Validate `form` and create the token from the active wallet.
pub async fn mint_token(
    form: &TokenMintForm,
    wallet: &WalletSession,
    ledger: &dyn Ledger,
    notifier: &dyn NotificationSink,
) -> Result<AssetReceipt> {
    let params = form.validate().inspect_err(|e| {
        notifier.notify(Notification::error(e.to_string()));
    })?;
    let active = wallet.require().inspect_err(|e| {
        notifier.notify(Notification::error(e.to_string()));
    })?;

    let request = AssetCreateRequest {
        sender: active.address.to_string(),
        total: params.on_chain_total,
        decimals: params.decimals,
        asset_name: params.asset_name,
        unit_name: params.unit_name,
        url: None,
        metadata_hash: None,
        default_frozen: false,
    };

    match ledger.create_asset(&active, &request).await {
        Ok(receipt) => {
            info!(
                "Token {} minted as asset {} (total {})",
                request.unit_name, receipt.asset_id, request.total
            );
            notifier.notify(Notification::success(format!(
                "Token minted successfully! Asset ID: {}",
                receipt.asset_id
            )));
            Ok(receipt)
        }
        Err(e) => {
            error!("Token mint failed: {}", e);
            notifier.notify(Notification::error(format!("Failed to mint token: {e}")));
            Err(e)
        }
    }
}
