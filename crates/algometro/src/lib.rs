//! # algometro
//!
//! Seat booking and ticket checkout for the AlgoMetro bus demo.
//!
//! A session holds an [`AppState`]: the seat registry, the user's tickets and
//! the current view. Workflows never mutate it directly. The checkout returns
//! a [`BookingDelta`] that the caller applies once the ledger has confirmed
//! both the fare payment and the ticket asset.
//!
//! Ledger access, metadata pinning and template lookup sit behind traits
//! ([`Ledger`], [`PinningService`], [`TemplateSource`]) so a session can run
//! against a signing gateway, an in-memory ledger or test fakes.

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod pinning;
pub mod state;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use config::MetroConfig;
pub use constants::*;
pub use error::{MetroError, Result, WalletIssue};
pub use events::{Notification, NotificationLog, NotificationSink, Severity, TracingSink};
pub use instructions::checkout::{
    CheckoutOutcome, CheckoutServices, CheckoutSettings, CheckoutStage, CheckoutStep,
    CheckoutWorkflow,
};
pub use instructions::nft_mint::NftMintForm;
pub use instructions::token_mint::{on_chain_total, TokenMintForm, TokenMintParams};
pub use instructions::MintForm;
pub use ledger::{
    ActiveWallet, AssetCreateRequest, AssetReceipt, Ledger, PaymentReceipt, PaymentRequest,
    RpcLedger, SignerHandle, SimulatedLedger, WalletSession,
};
pub use pinning::{ContentRef, PinataClient, PinataCredentials, PinningService};
pub use state::app::{AppState, BookingDelta, View};
pub use state::seat::{SeatRegistry, SeatStatus};
pub use state::ticket::Ticket;
pub use template::{
    FileTemplateSource, HttpTemplateSource, MetadataTemplate, NoTemplate, TemplateOrigin,
    TemplateSource,
};
