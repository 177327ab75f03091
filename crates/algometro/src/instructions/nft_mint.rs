//! Unique asset minted from a metadata URL.

use tracing::{error, info};

use crate::constants::{PASS_ASSET_NAME, PASS_UNIT_NAME};
use crate::error::{MetroError, Result};
use crate::events::{Notification, NotificationSink};
use crate::ledger::{AssetCreateRequest, AssetReceipt, Ledger, WalletSession};
use crate::state::metadata::metadata_digest;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NftMintForm {
    /// Metadata location, e.g. `ipfs://Qm...`.
    pub metadata_url: String,
}

impl NftMintForm {
    /// Asset request for `sender`. The metadata hash is the digest of the URL.
    pub fn to_request(&self, sender: &str) -> Result<AssetCreateRequest> {
        let url = self.metadata_url.trim();
        if url.is_empty() {
            return Err(MetroError::InvalidInput(
                "please enter a metadata URL".to_string(),
            ));
        }
        Ok(AssetCreateRequest {
            sender: sender.to_string(),
            total: 1,
            decimals: 0,
            asset_name: PASS_ASSET_NAME.to_string(),
            unit_name: PASS_UNIT_NAME.to_string(),
            url: Some(url.to_string()),
            metadata_hash: Some(metadata_digest(url.as_bytes())),
            default_frozen: false,
        })
    }
}

pub async fn mint_nft(
    form: &NftMintForm,
    wallet: &WalletSession,
    ledger: &dyn Ledger,
    notifier: &dyn NotificationSink,
) -> Result<AssetReceipt> {
    // Validate before looking at the wallet.
    form.to_request("").inspect_err(|e| {
        notifier.notify(Notification::error(e.to_string()));
    })?;
    let active = wallet.require().inspect_err(|e| {
        notifier.notify(Notification::error(e.to_string()));
    })?;
    let request = form.to_request(active.address)?;

    match ledger.create_asset(&active, &request).await {
        Ok(receipt) => {
            info!("NFT minted as asset {}", receipt.asset_id);
            notifier.notify(Notification::success(format!(
                "NFT minted successfully! Asset ID: {}",
                receipt.asset_id
            )));
            Ok(receipt)
        }
        Err(e) => {
            error!("NFT mint failed: {}", e);
            notifier.notify(Notification::error("Failed to mint NFT. Please try again."));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let form = NftMintForm {
            metadata_url: " ipfs://QmYourHashHere ".into(),
        };
        let req = form.to_request("ADDR").unwrap();
        assert_eq!(req.total, 1);
        assert_eq!(req.decimals, 0);
        assert_eq!(req.asset_name, "MasterPass Ticket");
        assert_eq!(req.unit_name, "MTK");
        assert_eq!(req.url.as_deref(), Some("ipfs://QmYourHashHere"));
        assert_eq!(
            req.metadata_hash,
            Some(metadata_digest(b"ipfs://QmYourHashHere"))
        );
        assert!(!req.default_frozen);
    }

    #[test]
    fn test_empty_url_is_invalid() {
        let err = NftMintForm::default().to_request("ADDR").unwrap_err();
        assert!(matches!(err, MetroError::InvalidInput(_)));
    }
}
