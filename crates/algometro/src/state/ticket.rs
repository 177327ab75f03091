//! Ticket – the user's receipt for a booked seat.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::EXPLORER_ASSET_URL;

/// Receipt created once a checkout has paid for the seat and issued its
/// ticket asset. Tickets are never modified after creation.
///
/// A ticket only exists for a confirmed asset, so `verified` is always true
/// for tickets produced by the checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Booking instant in Unix milliseconds.
    pub id: u64,

    pub seat: u8,

    /// Calendar date of the booking (UTC).
    pub booking_date: NaiveDate,

    /// Ledger id of the ticket asset.
    pub asset_id: u64,

    /// Transaction that paid the fare.
    pub payment_txn: String,

    /// Transaction that created the ticket asset.
    pub mint_txn: String,

    /// `ipfs://<cid>#arc3` URL stored on the asset.
    pub metadata_url: String,

    pub verified: bool,
}

impl Ticket {
    /// Display label, e.g. `ASA-1234`.
    pub fn nft_label(&self) -> String {
        format!("ASA-{}", self.asset_id)
    }

    pub fn explorer_url(&self) -> String {
        format!("{}{}", EXPLORER_ASSET_URL, self.asset_id)
    }
}
