//! # Roombook Client
//!
//! Client side of the meeting-room booking service.
//!
//! - **config**: environment-driven settings
//! - **session**: the signed-in user's token, passed explicitly to API calls
//! - **api**: typed REST client for the booking backend
//! - **panel**: view-model for booking slots of one room and day
//! - **mock**: `mockall` double of [`api::BookingApi`] for tests

pub mod api;
pub mod config;
pub mod mock;
pub mod panel;
pub mod session;

pub use api::{BookingApi, HttpApi};
pub use config::{AuthScheme, ClientConfig};
pub use panel::{BookingPanel, FetchTicket, SlotView};
pub use session::Session;
