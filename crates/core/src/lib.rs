//! # Roombook Core
//!
//! Domain types shared by the meeting-room booking client.
//!
//! - **slots**: generates the bookable slots of a day and detects collisions
//!   with existing bookings
//! - **selection**: the user's pending slot selection and its contiguity check
//! - **models**: wire types of the booking backend's REST API
//! - **errors**: the error taxonomy used across the workspace

pub mod errors;
pub mod models;
pub mod selection;
pub mod slots;

pub use errors::{BookingError, BookingResult};
pub use selection::{toggle_slot, validate_contiguous, SelectionSet, Toggle};
pub use slots::{
    day_bounds, generate_slots, is_booked, BookingInterval, DayBoundary, SlotIter, SlotWindow,
    TimeSlot,
};
