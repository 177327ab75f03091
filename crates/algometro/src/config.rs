//! Session configuration.
//!
//! Loaded from the JSON file named by `METRO_CONFIG`, then overridden by a
//! few environment variables so that pinning credentials never have to live
//! in the file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{DEFAULT_RESERVED_SEATS, PINATA_PIN_JSON_URL, TICKET_PRICE_MICROALGOS};
use crate::error::{MetroError, Result};
use crate::pinning::PinataCredentials;

pub const CONFIG_PATH_VAR: &str = "METRO_CONFIG";
pub const PINATA_API_KEY_VAR: &str = "PINATA_API_KEY";
pub const PINATA_SECRET_KEY_VAR: &str = "PINATA_SECRET_KEY";
pub const LEDGER_URL_VAR: &str = "METRO_LEDGER_URL";
pub const WALLET_ADDRESS_VAR: &str = "METRO_WALLET_ADDRESS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetroConfig {
    /// JSON-RPC endpoint of the signing gateway.
    pub ledger_rpc_url: String,
    /// Network label used in logs and explorer links.
    pub network: String,
    /// If true, the session runs against an in-memory ledger.
    pub simulate_ledger: bool,
    /// Fare receiver. When unset the payer pays itself.
    pub treasury_address: Option<String>,
    /// Fare per seat; defaults to [`TICKET_PRICE_MICROALGOS`].
    pub ticket_price_microalgos: u64,
    /// URL of the metadata template, usually `<site>/AlgoMetroNft.json`.
    pub template_url: Option<String>,
    /// Local template file, used when no URL is configured.
    pub template_path: Option<String>,
    pub pinata_endpoint: String,
    #[serde(skip_serializing)]
    pub pinata_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub pinata_secret_key: Option<String>,
    /// Seats held by other passengers at session start.
    pub reserved_seats: Vec<u8>,
    pub max_confirmation_polls: u32,
    pub confirmation_poll_ms: u64,
    pub wallet_address: Option<String>,
    /// Signer label handed to the gateway. No signer means read-only wallet.
    pub signer: Option<String>,
    /// Seat booked by the headless session runner.
    pub session_seat: u8,
}

impl Default for MetroConfig {
    fn default() -> Self {
        Self {
            ledger_rpc_url: "http://localhost:4001".to_string(),
            network: "testnet".to_string(),
            simulate_ledger: false,
            treasury_address: None,
            ticket_price_microalgos: TICKET_PRICE_MICROALGOS,
            template_url: None,
            template_path: None,
            pinata_endpoint: PINATA_PIN_JSON_URL.to_string(),
            pinata_api_key: None,
            pinata_secret_key: None,
            reserved_seats: DEFAULT_RESERVED_SEATS.to_vec(),
            max_confirmation_polls: 20,
            confirmation_poll_ms: 500,
            wallet_address: None,
            signer: None,
            session_seat: 7,
        }
    }
}

impl MetroConfig {
    /// Load from `METRO_CONFIG` and the process environment.
    pub fn load() -> Self {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.is_empty() => match Self::from_file(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Failed to load config from {}, using defaults: {}", path, e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let expanded = expand_tilde(path);
        let contents = std::fs::read_to_string(&expanded)
            .map_err(|e| MetroError::Config(format!("read {}: {e}", expanded.display())))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| MetroError::Config(e.to_string()))
    }

    /// Override fields from environment lookups. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(PINATA_API_KEY_VAR) {
            self.pinata_api_key = Some(v);
        }
        if let Some(v) = get(PINATA_SECRET_KEY_VAR) {
            self.pinata_secret_key = Some(v);
        }
        if let Some(v) = get(LEDGER_URL_VAR) {
            self.ledger_rpc_url = v;
        }
        if let Some(v) = get(WALLET_ADDRESS_VAR) {
            self.wallet_address = Some(v);
        }
    }

    /// Both pinning keys, or nothing.
    pub fn pinata_credentials(&self) -> Option<PinataCredentials> {
        let api_key = self.pinata_api_key.as_deref().filter(|k| !k.is_empty())?;
        let secret_key = self.pinata_secret_key.as_deref().filter(|k| !k.is_empty())?;
        Some(PinataCredentials {
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    pub fn template_path(&self) -> Option<PathBuf> {
        self.template_path.as_deref().map(expand_tilde)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut p = PathBuf::from(home);
            if path.len() > 2 {
                p.push(&path[2..]);
            }
            return p;
        }
    }
    PathBuf::from(path)
}
