use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::room::RoomId;
use super::user::UserId;
use crate::slots::BookingInterval;

pub type BookingId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Booking {
    pub fn interval(&self) -> BookingInterval {
        BookingInterval::new(self.start_time, self.end_time)
    }

    /// Bookings can only be cancelled before they start.
    pub fn is_cancellable(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }
}

/// Admin listing row, joined with the booking user and room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetail {
    pub id: BookingId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub username: String,
    pub room_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: RoomId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CreateBookingRequest {
    pub fn for_interval(room_id: RoomId, interval: BookingInterval, reason: Option<String>) -> Self {
        Self {
            room_id,
            start_time: interval.start,
            end_time: interval.end,
            reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    #[serde(default)]
    pub message: String,
    pub booking: Booking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBookingsResponse {
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBookingDetailsResponse {
    #[serde(default)]
    pub bookings: Vec<BookingDetail>,
}
