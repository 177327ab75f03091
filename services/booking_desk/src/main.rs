//! AlgoMetro Booking Desk
//!
//! Runs one booking session without a browser: selects the configured seat,
//! pays the fare, pins the ticket metadata and issues the ticket asset, then
//! prints the user's tickets as JSON.
//!
//! # Running
//!
//! ```bash
//! # Offline, against the in-memory ledger:
//! echo '{ "simulate_ledger": true, "wallet_address": "RIDER", "signer": "local" }' > desk.json
//! METRO_CONFIG=desk.json RUST_LOG=info cargo run -p booking_desk
//! ```
//!
//! Pinning keys come from `PINATA_API_KEY` / `PINATA_SECRET_KEY`. Without them
//! the ticket is issued with a placeholder content reference.

use algometro::{
    AppState, CheckoutServices, CheckoutSettings, CheckoutWorkflow, FileTemplateSource,
    HttpTemplateSource, Ledger, MetroConfig, NoTemplate, PinataClient, RpcLedger, SeatRegistry,
    SimulatedLedger, TemplateSource, TracingSink, View, WalletSession, MICROALGOS_PER_ALGO,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("AlgoMetro booking desk starting...");

    let config = MetroConfig::load();
    info!(
        "network={}, ledger={}, simulated={}, fare={} ALGO",
        config.network,
        config.ledger_rpc_url,
        config.simulate_ledger,
        config.ticket_price_microalgos as f64 / MICROALGOS_PER_ALGO as f64
    );

    let client = reqwest::Client::new();

    let ledger: Box<dyn Ledger> = if config.simulate_ledger {
        info!("Using in-memory ledger");
        Box::new(SimulatedLedger::new())
    } else {
        let rpc = RpcLedger::from_config(client.clone(), &config);
        match rpc.check_rpc().await {
            Ok(version) => info!("Connected to ledger gateway: {}", version),
            Err(e) => {
                error!("Ledger gateway connection failed: {}", e);
                std::process::exit(1);
            }
        }
        Box::new(rpc)
    };

    let templates: Box<dyn TemplateSource> = match (&config.template_url, config.template_path()) {
        (Some(url), _) => Box::new(HttpTemplateSource::new(client.clone(), url.clone())),
        (None, Some(path)) => Box::new(FileTemplateSource::new(path)),
        (None, None) => Box::new(NoTemplate),
    };

    let pinning = PinataClient::from_config(client.clone(), &config);

    let wallet = WalletSession::from_config(&config);
    let mut state = AppState::new(SeatRegistry::with_reserved(
        config.reserved_seats.iter().copied(),
    ));
    state.view = View::SeatMap;

    let seat = config.session_seat;
    if !state.seats.select_seat(seat) {
        error!("Seat {} cannot be selected", seat);
        std::process::exit(1);
    }
    if let Err(e) = state.confirm_selection(&wallet) {
        error!("{}", e);
        std::process::exit(1);
    }

    let notifier = TracingSink;
    let services = CheckoutServices {
        ledger: &*ledger,
        pinning: &pinning,
        templates: &*templates,
        notifier: &notifier,
    };
    let mut workflow = CheckoutWorkflow::new(CheckoutSettings::from_config(&config));

    let outcome = match workflow.run(&state, &wallet, &services).await {
        Ok(o) => o,
        Err(e) if e.is_precondition() => {
            state.back_to_seat_map();
            warn!(
                "Seat {} not booked: {}. {} seats still available",
                seat,
                e,
                state.seats.available_count()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("Checkout for seat {} failed at {:?}: {}", seat, workflow.stage(), e);
            for stranded in workflow.stranded_payments() {
                error!("Unreconciled payment: {}", stranded.tx_id);
            }
            std::process::exit(1);
        }
    };

    if outcome.content_ref.is_placeholder() {
        warn!(
            "Ticket metadata was not pinned; {} is a placeholder",
            outcome.content_ref.cid()
        );
    }
    if let Err(e) = state.apply(outcome.delta) {
        error!("Could not record booking: {}", e);
        std::process::exit(1);
    }
    state.view = View::Tickets;

    for ticket in state.tickets() {
        info!(
            "Seat {} → {} ({})",
            ticket.seat,
            ticket.nft_label(),
            ticket.explorer_url()
        );
    }
    match serde_json::to_string_pretty(state.tickets()) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Failed to render tickets: {}", e),
    }
}
