//! Fixed values for the AlgoMetro booking flow.
//!
//! Route and asset naming are part of the product and are not read from
//! configuration. The fare and the reserved seats here are defaults that
//! [`MetroConfig`](crate::config::MetroConfig) can override.

/// Number of seats on the bus. Seats are numbered `1..=SEAT_COUNT`.
pub const SEAT_COUNT: u8 = 40;

/// Seats already taken by other passengers when a session starts.
pub const DEFAULT_RESERVED_SEATS: &[u8] = &[5, 12, 18, 23];

/// Default fare for one seat, in micro-units of the ledger's native currency
/// (1 ALGO).
pub const TICKET_PRICE_MICROALGOS: u64 = 1_000_000;

/// Micro-units per whole unit of the native currency.
pub const MICROALGOS_PER_ALGO: u64 = 1_000_000;

pub const ROUTE: &str = "AlgoMetro Express";

/// Unit symbol of every seat ticket asset.
pub const TICKET_UNIT_NAME: &str = "AMTKT";

/// Seat ticket asset names are `"AlgoMetro #<seat>"`.
pub const TICKET_ASSET_NAME_PREFIX: &str = "AlgoMetro #";

/// Well-known path of the optional metadata template.
pub const TEMPLATE_PATH: &str = "/AlgoMetroNft.json";

pub const PINATA_PIN_JSON_URL: &str = "https://api.pinata.cloud/pinning/pinJSONToIPFS";
pub const PINATA_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs/";

/// Prefix of the content reference used when pinning is unavailable.
pub const PLACEHOLDER_PREFIX: &str = "QmPlaceholder";

/// Digest bytes carried by a placeholder content reference.
pub const PLACEHOLDER_DIGEST_BYTES: usize = 18;

/// URL fragment marking ARC-3 metadata.
pub const ARC3_FRAGMENT: &str = "#arc3";

pub const EXPLORER_ASSET_URL: &str = "https://testnet.algoexplorer.io/asset/";

// ── Token issuance limits ───────────────────────────────────────

pub const MAX_ASSET_NAME_LEN: usize = 32;
pub const MAX_UNIT_NAME_LEN: usize = 8;
pub const MAX_DECIMALS: u32 = 19;

/// Name and unit of assets minted from the metadata-URL form.
pub const PASS_ASSET_NAME: &str = "MasterPass Ticket";
pub const PASS_UNIT_NAME: &str = "MTK";
