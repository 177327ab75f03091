use algometro::state::metadata::{metadata_digest, serialize_metadata};
use algometro::{
    ActiveWallet, AppState, AssetCreateRequest, AssetReceipt, CheckoutServices, CheckoutSettings,
    CheckoutStage, CheckoutStep, CheckoutWorkflow, ContentRef, Ledger, MetroError,
    NotificationLog, PaymentReceipt, PaymentRequest, PinningService, SeatRegistry, Severity,
    SignerHandle, SimulatedLedger, TemplateOrigin, TemplateSource, View, WalletSession,
    DEFAULT_RESERVED_SEATS,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

const WALLET: &str = "RIDERADDRESS";

// ── Fakes ───────────────────────────────────────────────────────

/// Pinning service that is always down.
struct PinningOutage;

#[async_trait]
impl PinningService for PinningOutage {
    async fn pin_json(&self, _content: &Value, _name: &str) -> algometro::Result<String> {
        Err(MetroError::MetadataUploadFailed("503 Service Unavailable".into()))
    }
}

struct FixedPin(&'static str);

#[async_trait]
impl PinningService for FixedPin {
    async fn pin_json(&self, _content: &Value, name: &str) -> algometro::Result<String> {
        assert!(name.starts_with("algometro-seat-"));
        assert!(name.ends_with(".json"));
        Ok(self.0.to_string())
    }
}

struct StaticTemplate(Value);

#[async_trait]
impl TemplateSource for StaticTemplate {
    async fn fetch_template(&self) -> Option<Map<String, Value>> {
        self.0.as_object().cloned()
    }
}

/// Simulated ledger whose payments or asset creations are rejected.
struct RejectingLedger {
    inner: SimulatedLedger,
    reject_payment: bool,
    reject_asset: bool,
}

impl RejectingLedger {
    fn rejecting_payment() -> Self {
        Self {
            inner: SimulatedLedger::new(),
            reject_payment: true,
            reject_asset: false,
        }
    }

    fn rejecting_asset() -> Self {
        Self {
            inner: SimulatedLedger::new(),
            reject_payment: false,
            reject_asset: true,
        }
    }
}

#[async_trait]
impl Ledger for RejectingLedger {
    async fn send_payment(
        &self,
        wallet: &ActiveWallet<'_>,
        request: &PaymentRequest,
    ) -> algometro::Result<PaymentReceipt> {
        if self.reject_payment {
            return Err(MetroError::LedgerCallFailed("overspend".into()));
        }
        self.inner.send_payment(wallet, request).await
    }

    async fn create_asset(
        &self,
        wallet: &ActiveWallet<'_>,
        request: &AssetCreateRequest,
    ) -> algometro::Result<AssetReceipt> {
        if self.reject_asset {
            return Err(MetroError::LedgerCallFailed("asset creation rejected".into()));
        }
        self.inner.create_asset(wallet, request).await
    }
}

struct Harness {
    log: NotificationLog,
    state: AppState,
    wallet: WalletSession,
}

impl Harness {
    fn new() -> Self {
        Self {
            log: NotificationLog::new(),
            state: AppState::new(SeatRegistry::with_reserved(DEFAULT_RESERVED_SEATS.iter().copied())),
            wallet: WalletSession::connected(WALLET, SignerHandle::new("pera")),
        }
    }

    fn services<'a>(
        &'a self,
        ledger: &'a dyn Ledger,
        pinning: &'a dyn PinningService,
        templates: &'a dyn TemplateSource,
    ) -> CheckoutServices<'a> {
        CheckoutServices {
            ledger,
            pinning,
            templates,
            notifier: &self.log,
        }
    }
}

// ── Scenarios ───────────────────────────────────────────────────

#[tokio::test]
async fn test_checkout_completes_through_pinning_outage() {
    let mut h = Harness::new();
    let ledger = SimulatedLedger::new();
    let templates = algometro::NoTemplate;

    assert!(h.state.seats.select_seat(7));
    assert_eq!(h.state.confirm_selection(&h.wallet).unwrap(), 7);

    let mut workflow = CheckoutWorkflow::default();
    let outcome = workflow
        .run(&h.state, &h.wallet, &h.services(&ledger, &PinningOutage, &templates))
        .await
        .unwrap();

    assert_eq!(workflow.stage(), CheckoutStage::Complete);
    assert!(outcome.content_ref.is_placeholder());
    assert!(outcome.content_ref.cid().starts_with("QmPlaceholder"));
    assert_eq!(outcome.template_origin, TemplateOrigin::Default);
    assert_eq!(
        outcome.delta.ticket.metadata_url,
        format!("ipfs://{}#arc3", outcome.content_ref.cid())
    );
    assert_eq!(h.log.count(Severity::Warning), 1);
    assert_eq!(h.log.count(Severity::Error), 0);

    // The workflow itself did not touch the state.
    assert!(h.state.tickets().is_empty());
    assert!(!h.state.seats.is_booked(7));

    h.state.apply(outcome.delta).unwrap();
    assert_eq!(h.state.tickets().len(), 1);
    assert_eq!(h.state.tickets()[0].seat, 7);
    assert!(h.state.tickets()[0].verified);
    assert_eq!(h.state.seats.booked().collect::<Vec<_>>(), vec![7]);
    assert_eq!(h.state.view, View::Success);
    assert!(h.state.is_consistent());

    assert!(!h.state.seats.select_seat(7));
    assert_eq!(h.state.seats.selected(), None);
}

#[tokio::test]
async fn test_checkout_issues_arc3_ticket_asset() {
    let h = {
        let mut h = Harness::new();
        h.state.seats.select_seat(7);
        h
    };
    let ledger = SimulatedLedger::new();
    let templates = algometro::NoTemplate;

    let mut workflow = CheckoutWorkflow::default();
    let outcome = workflow
        .run(&h.state, &h.wallet, &h.services(&ledger, &FixedPin("QmTicketCid"), &templates))
        .await
        .unwrap();

    assert_eq!(outcome.content_ref, ContentRef::Pinned("QmTicketCid".into()));

    let payments = ledger.payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].sender, WALLET);
    assert_eq!(payments[0].receiver, WALLET);
    assert_eq!(payments[0].amount, 1_000_000);

    let assets = ledger.assets();
    assert_eq!(assets.len(), 1);
    let (asset_id, req) = &assets[0];
    assert_eq!(*asset_id, outcome.delta.ticket.asset_id);
    assert_eq!(req.total, 1);
    assert_eq!(req.decimals, 0);
    assert_eq!(req.asset_name, "AlgoMetro #7");
    assert_eq!(req.unit_name, "AMTKT");
    assert_eq!(req.url.as_deref(), Some("ipfs://QmTicketCid#arc3"));
    assert!(!req.default_frozen);
    assert_eq!(
        req.metadata_hash,
        Some(metadata_digest(serialize_metadata(&outcome.metadata).as_bytes()))
    );

    let ticket = &outcome.delta.ticket;
    assert_eq!(ticket.payment_txn, outcome.payment.tx_id);
    assert_eq!(ticket.mint_txn, outcome.asset.tx_id);
    assert_eq!(outcome.metadata["properties"]["payment_txn"], outcome.payment.tx_id.as_str());
    assert_eq!(outcome.metadata["properties"]["seat_number"], "7");
}

#[tokio::test]
async fn test_treasury_receives_fare() {
    let mut h = Harness::new();
    h.state.seats.select_seat(30);
    let ledger = SimulatedLedger::new();
    let templates = algometro::NoTemplate;

    let mut workflow = CheckoutWorkflow::new(CheckoutSettings {
        price_microalgos: 2_500_000,
        treasury_address: Some("TREASURY".into()),
    });
    workflow
        .run(&h.state, &h.wallet, &h.services(&ledger, &PinningOutage, &templates))
        .await
        .unwrap();

    let payments = ledger.payments();
    assert_eq!(payments[0].receiver, "TREASURY");
    assert_eq!(payments[0].amount, 2_500_000);
}

#[tokio::test]
async fn test_custom_template_is_merged() {
    let mut h = Harness::new();
    h.state.seats.select_seat(7);
    let ledger = SimulatedLedger::new();
    let templates = StaticTemplate(json!({
        "name": "Night Bus",
        "image": "ipfs://night",
        "properties": { "type": "Night Ticket" }
    }));

    let mut workflow = CheckoutWorkflow::default();
    let outcome = workflow
        .run(&h.state, &h.wallet, &h.services(&ledger, &FixedPin("QmNight"), &templates))
        .await
        .unwrap();

    assert_eq!(outcome.template_origin, TemplateOrigin::Fetched);
    assert_eq!(outcome.metadata["name"], "Night Bus - Seat #7");
    assert_eq!(outcome.metadata["description"], "AlgoMetro bus ticket - Seat 7");
    assert_eq!(outcome.metadata["image"], "ipfs://night");
    assert_eq!(outcome.metadata["properties"]["type"], "Night Ticket");
    assert_eq!(outcome.metadata["properties"]["route"], "AlgoMetro Express");
}

#[tokio::test]
async fn test_payment_failure_aborts_before_metadata() {
    let mut h = Harness::new();
    h.state.seats.select_seat(7);
    let ledger = RejectingLedger::rejecting_payment();
    let templates = algometro::NoTemplate;

    let mut workflow = CheckoutWorkflow::default();
    let err = workflow
        .run(&h.state, &h.wallet, &h.services(&ledger, &FixedPin("QmX"), &templates))
        .await
        .unwrap_err();

    assert!(matches!(err, MetroError::LedgerCallFailed(_)));
    assert_eq!(workflow.stage(), CheckoutStage::Failed(CheckoutStep::Paying));
    assert!(workflow.stranded_payments().is_empty());
    assert!(ledger.inner.assets().is_empty());

    let last = h.log.last().unwrap();
    assert_eq!(last.severity, Severity::Error);
    assert!(last.message.starts_with("Transaction failed:"));

    assert!(h.state.tickets().is_empty());
    assert_eq!(h.state.seats.selected(), Some(7));
}

#[tokio::test]
async fn test_issuance_failure_strands_payment() {
    let mut h = Harness::new();
    h.state.seats.select_seat(7);
    let ledger = RejectingLedger::rejecting_asset();
    let templates = algometro::NoTemplate;

    let mut workflow = CheckoutWorkflow::default();
    let err = workflow
        .run(&h.state, &h.wallet, &h.services(&ledger, &PinningOutage, &templates))
        .await
        .unwrap_err();

    assert!(matches!(err, MetroError::LedgerCallFailed(_)));
    assert_eq!(workflow.stage(), CheckoutStage::Failed(CheckoutStep::Issuing));
    assert_eq!(ledger.inner.payments().len(), 1);
    assert_eq!(workflow.stranded_payments().len(), 1);
    assert_eq!(workflow.stranded_payments()[0].tx_id, "SIMPAY000001");

    assert!(h.state.tickets().is_empty());
    assert!(!h.state.seats.is_booked(7));
    assert!(h.state.is_consistent());

    // A failed run is not in flight; the user can try again.
    assert!(!workflow.is_in_flight());
}

#[tokio::test]
async fn test_wallet_without_signer_is_rejected() {
    let mut h = Harness::new();
    h.state.seats.select_seat(7);
    h.wallet = WalletSession::watch_only(WALLET);
    let ledger = SimulatedLedger::new();
    let templates = algometro::NoTemplate;

    let mut workflow = CheckoutWorkflow::default();
    let err = workflow
        .run(&h.state, &h.wallet, &h.services(&ledger, &PinningOutage, &templates))
        .await
        .unwrap_err();

    assert!(matches!(err, MetroError::WalletUnavailable(_)));
    assert_eq!(
        workflow.stage(),
        CheckoutStage::Failed(CheckoutStep::Authorizing)
    );
    assert!(ledger.payments().is_empty());
    assert!(h.state.tickets().is_empty());
}

#[tokio::test]
async fn test_two_bookings_in_one_session() {
    let mut h = Harness::new();
    let ledger = SimulatedLedger::new();
    let templates = algometro::NoTemplate;
    let mut workflow = CheckoutWorkflow::default();

    for seat in [7, 8] {
        assert!(h.state.seats.select_seat(seat));
        let outcome = workflow
            .run(&h.state, &h.wallet, &h.services(&ledger, &PinningOutage, &templates))
            .await
            .unwrap();
        h.state.apply(outcome.delta).unwrap();
    }

    assert_eq!(h.state.tickets().len(), 2);
    assert_ne!(h.state.tickets()[0].asset_id, h.state.tickets()[1].asset_id);
    assert_eq!(h.state.seats.booked().collect::<Vec<_>>(), vec![7, 8]);
    assert!(h.state.is_consistent());
    assert_eq!(h.state.seats.available_count(), 40 - 4 - 2);
}
