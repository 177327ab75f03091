//! Booking and issuance workflows.

pub mod checkout;
pub mod nft_mint;
pub mod token_mint;

use crate::error::Result;
use crate::events::NotificationSink;
use crate::ledger::{AssetReceipt, Ledger, WalletSession};

use nft_mint::NftMintForm;
use token_mint::TokenMintForm;

/// The two asset mint forms.
#[derive(Clone, Debug)]
pub enum MintForm {
    Fungible(TokenMintForm),
    Unique(NftMintForm),
}

impl MintForm {
    /// Validate the form and mint its asset.
    pub async fn issue(
        &self,
        wallet: &WalletSession,
        ledger: &dyn Ledger,
        notifier: &dyn NotificationSink,
    ) -> Result<AssetReceipt> {
        match self {
            MintForm::Fungible(form) => token_mint::mint_token(form, wallet, ledger, notifier).await,
            MintForm::Unique(form) => nft_mint::mint_nft(form, wallet, ledger, notifier).await,
        }
    }
}
