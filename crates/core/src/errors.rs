use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Slot {0} is already booked and cannot be selected")]
    NotSelectable(String),

    #[error("Selected slots are not contiguous: gap between {previous_end} and {next_start}")]
    Contiguity {
        previous_end: DateTime<Utc>,
        next_start: DateTime<Utc>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    /// 401 on a request that carried the session token.
    #[error("Session rejected: {0}")]
    SessionExpired(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Booking conflict: {0}")]
    Conflict(String),

    #[error("Server responded with {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] eyre::Report),
}

impl BookingError {
    /// True when the backend rejected the session token and it should be dropped.
    ///
    /// Bad credentials on login are `Authentication` and leave any stored
    /// session alone.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, BookingError::SessionExpired(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
