//! In-memory session state: seats, tickets, ticket metadata.

pub mod app;
pub mod metadata;
pub mod seat;
pub mod ticket;
