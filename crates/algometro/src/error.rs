//! Error type for the AlgoMetro booking flows.

use std::fmt;

use thiserror::Error;

/// Why a wallet cannot be used for a ledger call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletIssue {
    /// No active address: the user has not connected a wallet.
    NotConnected,
    /// An address is present but the provider exposes no signer.
    NoSigner,
}

impl fmt::Display for WalletIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletIssue::NotConnected => f.write_str("please connect your wallet first"),
            WalletIssue::NoSigner => {
                f.write_str("wallet signer not available, please reconnect your wallet")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum MetroError {
    // ── Session preconditions ───────────────────────────────────
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(WalletIssue),

    #[error("Please select a seat")]
    NoSeatSelected,

    #[error("Seat {0} is not available")]
    SeatUnavailable(u8),

    #[error("A checkout is already in progress")]
    CheckoutInProgress,

    // ── Form validation ─────────────────────────────────────────
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── External calls ──────────────────────────────────────────
    #[error("Ledger call failed: {0}")]
    LedgerCallFailed(String),

    #[error("Metadata upload failed: {0}")]
    MetadataUploadFailed(String),

    // ── Setup ───────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MetroError {
    /// True for failures raised before any external call was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MetroError::WalletUnavailable(_)
                | MetroError::NoSeatSelected
                | MetroError::SeatUnavailable(_)
                | MetroError::CheckoutInProgress
                | MetroError::InvalidInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MetroError>;
