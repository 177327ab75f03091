//! Application state for one booking session.

use serde::Serialize;
use tracing::info;

use crate::error::{MetroError, Result, WalletIssue};
use crate::ledger::WalletSession;
use crate::state::seat::SeatRegistry;
use crate::state::ticket::Ticket;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Home,
    SeatMap,
    Checkout,
    Success,
    Tickets,
}

/// Result of a successful checkout, applied with [`AppState::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingDelta {
    pub seat: u8,
    pub ticket: Ticket,
}

/// Everything a session knows. Workflows read it and hand back deltas;
/// only [`AppState::apply`] books seats and records tickets, which keeps
/// the booked set and the ticket list in step.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub seats: SeatRegistry,
    tickets: Vec<Ticket>,
    pub view: View,
}

impl AppState {
    pub fn new(seats: SeatRegistry) -> Self {
        Self {
            seats,
            tickets: Vec::new(),
            view: View::Home,
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn ticket_for_seat(&self, seat: u8) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.seat == seat)
    }

    /// Move from the seat map to checkout for the selected seat.
    pub fn confirm_selection(&mut self, wallet: &WalletSession) -> Result<u8> {
        if wallet.address().is_none() {
            return Err(MetroError::WalletUnavailable(WalletIssue::NotConnected));
        }
        let seat = self.seats.selected().ok_or(MetroError::NoSeatSelected)?;
        self.view = View::Checkout;
        Ok(seat)
    }

    /// Leave checkout without booking: drop the selection, show the seat map.
    pub fn back_to_seat_map(&mut self) {
        self.seats.clear_selection();
        self.view = View::SeatMap;
    }

    /// Book the delta's seat and record its ticket.
    pub fn apply(&mut self, delta: BookingDelta) -> Result<()> {
        if delta.ticket.seat != delta.seat || self.ticket_for_seat(delta.seat).is_some() {
            return Err(MetroError::SeatUnavailable(delta.seat));
        }
        if !self.seats.mark_booked(delta.seat) {
            return Err(MetroError::SeatUnavailable(delta.seat));
        }
        info!(
            "Seat {} booked with ticket {}",
            delta.seat,
            delta.ticket.nft_label()
        );
        self.tickets.push(delta.ticket);
        self.view = View::Success;
        Ok(())
    }

    /// Every booked seat has exactly one verified ticket and vice versa.
    pub fn is_consistent(&self) -> bool {
        let booked: Vec<u8> = self.seats.booked().collect();
        booked.len() == self.tickets.len()
            && booked.iter().all(|s| {
                self.tickets
                    .iter()
                    .filter(|t| t.seat == *s && t.verified)
                    .count()
                    == 1
            })
    }
}
