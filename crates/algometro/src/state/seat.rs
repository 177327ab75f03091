//! Seat registry – which seats are booked, reserved or selected.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::constants::SEAT_COUNT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Selected,
    /// Booked in this session; backed by one of the user's tickets.
    Booked,
    /// Held by another passenger before the session started.
    Reserved,
}

/// Seat state for one bus.
///
/// `booked` only ever grows, and only through a confirmed checkout. At most
/// one seat is selected at a time.
#[derive(Clone, Debug, Default)]
pub struct SeatRegistry {
    booked: BTreeSet<u8>,
    reserved: BTreeSet<u8>,
    selected: Option<u8>,
}

impl SeatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with seats already held by other passengers.
    /// Out-of-range seat numbers are ignored.
    pub fn with_reserved(reserved: impl IntoIterator<Item = u8>) -> Self {
        Self {
            reserved: reserved.into_iter().filter(|s| in_range(*s)).collect(),
            ..Self::default()
        }
    }

    /// Select `seat`. Returns false, leaving the selection untouched, when the
    /// seat does not exist or is not available.
    pub fn select_seat(&mut self, seat: u8) -> bool {
        if !self.is_available(seat) {
            return false;
        }
        self.selected = Some(seat);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<u8> {
        self.selected
    }

    pub fn is_booked(&self, seat: u8) -> bool {
        self.booked.contains(&seat)
    }

    pub fn is_available(&self, seat: u8) -> bool {
        in_range(seat) && !self.booked.contains(&seat) && !self.reserved.contains(&seat)
    }

    /// Status of `seat`, or `None` if the bus has no such seat.
    pub fn status(&self, seat: u8) -> Option<SeatStatus> {
        if !in_range(seat) {
            return None;
        }
        let status = if self.booked.contains(&seat) {
            SeatStatus::Booked
        } else if self.reserved.contains(&seat) {
            SeatStatus::Reserved
        } else if self.selected == Some(seat) {
            SeatStatus::Selected
        } else {
            SeatStatus::Available
        };
        Some(status)
    }

    /// Every seat with its status, in seat order.
    pub fn seats(&self) -> impl Iterator<Item = (u8, SeatStatus)> + '_ {
        (1..=SEAT_COUNT).filter_map(move |s| self.status(s).map(|st| (s, st)))
    }

    pub fn available_count(&self) -> usize {
        (1..=SEAT_COUNT).filter(|s| self.is_available(*s)).count()
    }

    pub fn booked(&self) -> impl Iterator<Item = u8> + '_ {
        self.booked.iter().copied()
    }

    /// Record a confirmed booking. Returns false if the seat was not available.
    pub(crate) fn mark_booked(&mut self, seat: u8) -> bool {
        if !self.is_available(seat) {
            return false;
        }
        self.booked.insert(seat);
        if self.selected == Some(seat) {
            self.selected = None;
        }
        true
    }
}

fn in_range(seat: u8) -> bool {
    (1..=SEAT_COUNT).contains(&seat)
}
