//! Ticket metadata documents and their digests.
//!
//! A ticket's metadata is a template document with the booking fields merged
//! in. The serialized form is what gets pinned, and its SHA-512/256 digest
//! is stored on the asset as the metadata hash.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha512_256};

use crate::constants::{PLACEHOLDER_DIGEST_BYTES, PLACEHOLDER_PREFIX, ROUTE};

pub const DEFAULT_NAME: &str = "AlgoMetro Ticket";
pub const DEFAULT_DESCRIPTION: &str =
    "Official AlgoMetro bus ticket - Your pass to ride the blockchain bus!";
pub const DEFAULT_IMAGE: &str =
    "https://gateway.pinata.cloud/ipfs/bafkreih5aznjvttude6c3wbvqeebb6rlx5wkbzyppv7garjiubll2ceym4";

/// Used when a template has no usable `name` / `description`.
const FALLBACK_NAME: &str = "AlgoMetro";
const FALLBACK_DESCRIPTION: &str = "AlgoMetro bus ticket";

/// The built-in template.
pub fn default_template() -> Map<String, Value> {
    let doc = json!({
        "name": DEFAULT_NAME,
        "description": DEFAULT_DESCRIPTION,
        "image": DEFAULT_IMAGE,
        "decimals": 0,
        "properties": {
            "type": "Bus Ticket",
            "service": ROUTE,
        }
    });
    match doc {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Merge the booking fields for `seat` into `template`.
///
/// Every template key is kept. `name` and `description` get a seat suffix,
/// and `properties` gains the seat, route, booking time and payment reference.
pub fn merge_ticket_metadata(
    template: &Map<String, Value>,
    seat: u8,
    booked_at: DateTime<Utc>,
    payment_txn: &str,
) -> Value {
    let mut doc = template.clone();

    let name = display_text(template.get("name")).unwrap_or_else(|| FALLBACK_NAME.to_string());
    let description = display_text(template.get("description"))
        .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string());
    doc.insert("name".into(), json!(format!("{name} - Seat #{seat}")));
    doc.insert(
        "description".into(),
        json!(format!("{description} - Seat {seat}")),
    );

    let mut properties = match template.get("properties") {
        Some(Value::Object(p)) => p.clone(),
        _ => Map::new(),
    };
    properties.insert("seat_number".into(), json!(seat.to_string()));
    properties.insert("route".into(), json!(ROUTE));
    properties.insert(
        "booking_date".into(),
        json!(booked_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    properties.insert("payment_txn".into(), json!(payment_txn));
    doc.insert("properties".into(), Value::Object(properties));

    Value::Object(doc)
}

/// Canonical serialized form. Object keys come out sorted.
pub fn serialize_metadata(doc: &Value) -> String {
    doc.to_string()
}

/// 32-byte SHA-512/256 digest, as stored in the asset's metadata hash.
pub fn metadata_digest(data: &[u8]) -> [u8; 32] {
    let mut h = Sha512_256::new();
    h.update(data);
    h.finalize().into()
}

/// Content reference used in place of a pinned CID.
/// Same serialized metadata, same placeholder.
pub fn placeholder_content_ref(serialized: &str) -> String {
    let digest = metadata_digest(serialized.as_bytes());
    format!(
        "{}{}",
        PLACEHOLDER_PREFIX,
        URL_SAFE_NO_PAD.encode(&digest[..PLACEHOLDER_DIGEST_BYTES])
    )
}

/// Text of a scalar template field. Empty strings, `false`, zero, null and
/// containers count as missing.
fn display_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
