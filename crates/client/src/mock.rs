use async_trait::async_trait;
use mockall::mock;
use roombook_core::{
    errors::BookingResult,
    models::{
        booking::{Booking, CreateBookingRequest},
        room::RoomId,
    },
    slots::BookingInterval,
};

use crate::{api::BookingApi, session::Session};

// Mock backend for exercising the booking panel without a server
mock! {
    pub BookingApi {}

    #[async_trait]
    impl BookingApi for BookingApi {
        async fn list_bookings(
            &self,
            session: &Session,
            room_id: RoomId,
            window: BookingInterval,
        ) -> BookingResult<Vec<Booking>>;

        async fn create_booking(
            &self,
            session: &Session,
            request: &CreateBookingRequest,
        ) -> BookingResult<Booking>;
    }
}
