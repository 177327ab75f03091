//! Seat checkout: pay the fare, pin the ticket metadata, issue the ticket.
//!
//! The workflow is a sequential state machine:
//!
//! ```text
//! Idle → Paying → ResolvingMetadata → Uploading → Issuing → Complete
//!          │                                         │
//!          └──────────────► Failed(step) ◄───────────┘
//! ```
//!
//! Only the payment and the issuance touch the ledger. Template lookup and
//! pinning degrade to defaults instead of failing. A failed issuance after a
//! confirmed payment leaves the fare spent with no ticket. That payment is
//! kept in [`CheckoutWorkflow::stranded_payments`]; nothing refunds it.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::MetroConfig;
use crate::constants::{TICKET_ASSET_NAME_PREFIX, TICKET_PRICE_MICROALGOS, TICKET_UNIT_NAME};
use crate::error::{MetroError, Result};
use crate::events::{Notification, NotificationSink};
use crate::ledger::{AssetCreateRequest, AssetReceipt, Ledger, PaymentReceipt, PaymentRequest, WalletSession};
use crate::pinning::{ContentRef, PinningService};
use crate::state::app::{AppState, BookingDelta};
use crate::state::metadata::{
    merge_ticket_metadata, metadata_digest, placeholder_content_ref, serialize_metadata,
};
use crate::state::ticket::Ticket;
use crate::template::{resolve_template, TemplateOrigin, TemplateSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CheckoutStep {
    Authorizing,
    Paying,
    ResolvingMetadata,
    Uploading,
    Issuing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum CheckoutStage {
    #[default]
    Idle,
    Paying,
    ResolvingMetadata,
    Uploading,
    Issuing,
    Complete,
    Failed(CheckoutStep),
}

impl CheckoutStage {
    /// The step being worked on, if a run is between `Idle` and a final stage.
    fn active_step(self) -> Option<CheckoutStep> {
        match self {
            CheckoutStage::Paying => Some(CheckoutStep::Paying),
            CheckoutStage::ResolvingMetadata => Some(CheckoutStep::ResolvingMetadata),
            CheckoutStage::Uploading => Some(CheckoutStep::Uploading),
            CheckoutStage::Issuing => Some(CheckoutStep::Issuing),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub price_microalgos: u64,
    /// Fare receiver; `None` pays the payer's own address.
    pub treasury_address: Option<String>,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            price_microalgos: TICKET_PRICE_MICROALGOS,
            treasury_address: None,
        }
    }
}

impl CheckoutSettings {
    pub fn from_config(config: &MetroConfig) -> Self {
        Self {
            price_microalgos: config.ticket_price_microalgos,
            treasury_address: config.treasury_address.clone().filter(|a| !a.is_empty()),
        }
    }
}

/// External collaborators of one checkout.
#[derive(Clone, Copy)]
pub struct CheckoutServices<'a> {
    pub ledger: &'a dyn Ledger,
    pub pinning: &'a dyn PinningService,
    pub templates: &'a dyn TemplateSource,
    pub notifier: &'a dyn NotificationSink,
}

#[derive(Clone, Debug)]
pub struct CheckoutOutcome {
    /// Apply with [`AppState::apply`].
    pub delta: BookingDelta,
    pub payment: PaymentReceipt,
    pub asset: AssetReceipt,
    pub content_ref: ContentRef,
    pub template_origin: TemplateOrigin,
    /// Merged metadata as pinned.
    pub metadata: Value,
}

#[derive(Debug, Default)]
pub struct CheckoutWorkflow {
    settings: CheckoutSettings,
    stage: CheckoutStage,
    stranded: Vec<PaymentReceipt>,
}

impl CheckoutWorkflow {
    pub fn new(settings: CheckoutSettings) -> Self {
        Self {
            settings,
            stage: CheckoutStage::Idle,
            stranded: Vec::new(),
        }
    }

    pub fn stage(&self) -> CheckoutStage {
        self.stage
    }

    pub fn is_in_flight(&self) -> bool {
        self.stage.active_step().is_some()
    }

    /// Confirmed payments whose ticket was never issued.
    pub fn stranded_payments(&self) -> &[PaymentReceipt] {
        &self.stranded
    }

    /// Book the selected seat. `state` is only read; the returned delta
    /// carries the booking.
    ///
    /// Dropping the returned future part-way leaves the workflow in
    /// `Failed(step)` for the step that was interrupted, so the next run can
    /// start. A run dropped while issuing keeps its payment in
    /// [`stranded_payments`](Self::stranded_payments).
    pub async fn run(
        &mut self,
        state: &AppState,
        wallet: &WalletSession,
        services: &CheckoutServices<'_>,
    ) -> Result<CheckoutOutcome> {
        if self.is_in_flight() {
            return Err(MetroError::CheckoutInProgress);
        }
        let mut guard = AbandonGuard { workflow: self };
        let result = guard.workflow.execute(state, wallet, services).await;
        drop(guard);
        result
    }

    async fn execute(
        &mut self,
        state: &AppState,
        wallet: &WalletSession,
        services: &CheckoutServices<'_>,
    ) -> Result<CheckoutOutcome> {
        let notifier = services.notifier;
        self.stage = CheckoutStage::Idle;

        // ── 1. Preconditions ────────────────────────────────────
        let active = match wallet.require() {
            Ok(a) => a,
            Err(e) => return Err(self.fail(CheckoutStep::Authorizing, e, notifier)),
        };
        let seat = match state.seats.selected() {
            Some(s) if state.seats.is_available(s) => s,
            Some(s) => {
                return Err(self.fail(
                    CheckoutStep::Authorizing,
                    MetroError::SeatUnavailable(s),
                    notifier,
                ))
            }
            None => {
                return Err(self.fail(
                    CheckoutStep::Authorizing,
                    MetroError::NoSeatSelected,
                    notifier,
                ))
            }
        };

        // ── 2. Fare payment ─────────────────────────────────────
        self.stage = CheckoutStage::Paying;
        let receiver = match &self.settings.treasury_address {
            Some(treasury) => treasury.clone(),
            None => {
                warn!("No treasury address configured; fare for seat {} is paid to the payer", seat);
                active.address.to_string()
            }
        };
        notifier.notify(Notification::info("Processing payment..."));
        let payment_request = PaymentRequest {
            sender: active.address.to_string(),
            receiver,
            amount: self.settings.price_microalgos,
        };
        let payment = match services.ledger.send_payment(&active, &payment_request).await {
            Ok(p) => p,
            Err(e) => return Err(self.fail(CheckoutStep::Paying, e, notifier)),
        };
        notifier.notify(Notification::success(
            "Payment successful! Creating your NFT ticket...",
        ));

        // ── 3-4. Metadata ───────────────────────────────────────
        self.stage = CheckoutStage::ResolvingMetadata;
        let template = resolve_template(services.templates).await;
        let booked_at = Utc::now();
        let metadata = merge_ticket_metadata(&template.document, seat, booked_at, &payment.tx_id);
        let serialized = serialize_metadata(&metadata);

        // ── 5. Pinning ──────────────────────────────────────────
        self.stage = CheckoutStage::Uploading;
        notifier.notify(Notification::info("Uploading ticket metadata to IPFS..."));
        let pin_name = format!(
            "algometro-seat-{}-{}.json",
            seat,
            booked_at.timestamp_millis()
        );
        let content_ref = if !services.pinning.is_configured() {
            let placeholder = placeholder_content_ref(&serialized);
            warn!("Pinning keys not configured; using placeholder {}", placeholder);
            notifier.notify(Notification::warning(
                "Note: Configure Pinata keys for production use",
            ));
            ContentRef::Placeholder(placeholder)
        } else {
            match services.pinning.pin_json(&metadata, &pin_name).await {
                Ok(cid) => {
                    notifier.notify(Notification::success("Metadata uploaded to IPFS!"));
                    ContentRef::Pinned(cid)
                }
                Err(e) => {
                    let placeholder = placeholder_content_ref(&serialized);
                    warn!("Pinning failed ({}); using placeholder {}", e, placeholder);
                    notifier.notify(Notification::warning(
                        "Using local metadata (Pinata upload failed)",
                    ));
                    ContentRef::Placeholder(placeholder)
                }
            }
        };

        // ── 6. Ticket issuance ──────────────────────────────────
        self.stage = CheckoutStage::Issuing;
        notifier.notify(Notification::info("Minting your NFT ticket..."));
        let asset_request = AssetCreateRequest {
            sender: active.address.to_string(),
            total: 1,
            decimals: 0,
            asset_name: format!("{TICKET_ASSET_NAME_PREFIX}{seat}"),
            unit_name: TICKET_UNIT_NAME.to_string(),
            url: Some(content_ref.asset_url()),
            metadata_hash: Some(metadata_digest(serialized.as_bytes())),
            default_frozen: false,
        };
        // Counted as stranded until the asset is confirmed.
        self.stranded.push(payment.clone());
        let asset = match services.ledger.create_asset(&active, &asset_request).await {
            Ok(a) => {
                self.stranded.pop();
                a
            }
            Err(e) => {
                error!(
                    "Payment {} for seat {} is spent but no ticket was issued",
                    payment.tx_id, seat
                );
                return Err(self.fail(CheckoutStep::Issuing, e, notifier));
            }
        };

        // ── 7. Receipt ──────────────────────────────────────────
        let ticket = Ticket {
            id: u64::try_from(booked_at.timestamp_millis()).unwrap_or_default(),
            seat,
            booking_date: booked_at.date_naive(),
            asset_id: asset.asset_id,
            payment_txn: payment.tx_id.clone(),
            mint_txn: asset.tx_id.clone(),
            metadata_url: content_ref.asset_url(),
            verified: true,
        };
        self.stage = CheckoutStage::Complete;
        info!(
            "Seat {} ticket {} issued (metadata {})",
            seat,
            ticket.nft_label(),
            content_ref.gateway_url()
        );
        notifier.notify(Notification::success(format!(
            "Success! NFT Ticket #{} is now in your wallet!",
            asset.asset_id
        )));

        Ok(CheckoutOutcome {
            delta: BookingDelta { seat, ticket },
            payment,
            asset,
            content_ref,
            template_origin: template.origin,
            metadata,
        })
    }

    fn fail(
        &mut self,
        step: CheckoutStep,
        err: MetroError,
        notifier: &dyn NotificationSink,
    ) -> MetroError {
        self.stage = CheckoutStage::Failed(step);
        if err.is_precondition() {
            warn!("Checkout stopped before {:?}: {}", step, err);
        } else {
            error!("Checkout failed at {:?}: {}", step, err);
        }
        let message = match &err {
            MetroError::LedgerCallFailed(_) => format!("Transaction failed: {err}"),
            _ => err.to_string(),
        };
        notifier.notify(Notification::error(message));
        err
    }
}

/// Marks the interrupted step as failed if a run is dropped before it
/// reaches a final stage.
struct AbandonGuard<'w> {
    workflow: &'w mut CheckoutWorkflow,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if let Some(step) = self.workflow.stage.active_step() {
            warn!("Checkout abandoned during {:?}", step);
            self.workflow.stage = CheckoutStage::Failed(step);
        }
    }
}
