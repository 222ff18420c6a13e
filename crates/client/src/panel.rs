//! # Booking Panel
//!
//! View-model behind the room booking screen: the chosen room and day, the
//! slots of that day, the bookings already held, and the user's pending
//! selection. All state is owned by [`BookingPanel`] and changed only
//! through its methods; callers redraw after each call.
//!
//! ## Stale responses
//!
//! Bookings are fetched asynchronously whenever the room or day changes. A
//! slow response for an earlier choice must not overwrite the current one,
//! so every fetch is tagged with a [`FetchTicket`] and
//! [`BookingPanel::apply_intervals`] drops results whose ticket no longer
//! matches.

use chrono::NaiveDate;
use chrono_tz::Tz;
use roombook_core::{
    errors::{BookingError, BookingResult},
    models::{
        booking::{Booking, CreateBookingRequest},
        room::RoomId,
    },
    selection::{SelectionSet, Toggle},
    slots::{day_bounds, generate_slots, is_booked, BookingInterval, SlotWindow, TimeSlot},
};
use tracing::{debug, info, warn};

use crate::{api::BookingApi, session::Session};

/// Identifies the room/day a fetch was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub room_id: RoomId,
    pub day: NaiveDate,
    generation: u64,
}

/// One row of the slot grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub slot: TimeSlot,
    pub booked: bool,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct BookingPanel {
    room_id: Option<RoomId>,
    day: NaiveDate,
    tz: Tz,
    window: SlotWindow,
    slots: Vec<TimeSlot>,
    booked: Vec<BookingInterval>,
    selection: SelectionSet,
    generation: u64,
}

impl BookingPanel {
    pub fn new(day: NaiveDate, tz: Tz, window: SlotWindow) -> Self {
        Self {
            room_id: None,
            day,
            tz,
            window,
            slots: generate_slots(day, tz, &window).collect(),
            booked: Vec::new(),
            selection: SelectionSet::new(),
            generation: 0,
        }
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.room_id
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn booked(&self) -> &[BookingInterval] {
        &self.booked
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Switches room; the selection and known bookings are discarded.
    pub fn select_room(&mut self, room_id: RoomId) -> FetchTicket {
        if self.room_id != Some(room_id) {
            debug!(room_id, "room selected");
            self.room_id = Some(room_id);
            self.booked.clear();
        }
        self.selection.clear();
        self.next_ticket(room_id)
    }

    /// Switches day and regenerates the slot grid.
    ///
    /// Returns a ticket for refetching bookings when a room is selected.
    pub fn select_day(&mut self, day: NaiveDate) -> Option<FetchTicket> {
        if self.day != day {
            debug!(%day, "day selected");
            self.day = day;
            self.slots = generate_slots(day, self.tz, &self.window).collect();
            self.booked.clear();
        }
        self.selection.clear();
        let room_id = self.room_id?;
        Some(self.next_ticket(room_id))
    }

    /// Starts a refetch for the current room and day.
    pub fn begin_refresh(&mut self) -> Option<FetchTicket> {
        let room_id = self.room_id?;
        Some(self.next_ticket(room_id))
    }

    /// Stores fetched bookings if `ticket` is still current.
    ///
    /// Returns false, leaving state untouched, for stale tickets.
    pub fn apply_intervals(&mut self, ticket: FetchTicket, intervals: Vec<BookingInterval>) -> bool {
        if !self.is_current(&ticket) {
            debug!(
                room_id = ticket.room_id,
                day = %ticket.day,
                "discarding stale booking response"
            );
            return false;
        }
        self.booked = intervals;
        true
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.room_id == Some(ticket.room_id)
            && self.day == ticket.day
            && self.generation == ticket.generation
    }

    /// Fetches the current day's bookings and applies them.
    ///
    /// Returns false when the panel moved on while the request was in flight.
    pub async fn refresh<A>(&mut self, api: &A, session: &Session) -> BookingResult<bool>
    where
        A: BookingApi + ?Sized,
    {
        let Some(ticket) = self.begin_refresh() else {
            return Ok(false);
        };
        self.fetch(api, session, ticket).await
    }

    /// Fetches bookings for `ticket` and applies them if still current.
    pub async fn fetch<A>(
        &mut self,
        api: &A,
        session: &Session,
        ticket: FetchTicket,
    ) -> BookingResult<bool>
    where
        A: BookingApi + ?Sized,
    {
        let window = day_bounds(ticket.day, self.tz);
        let bookings = api.list_bookings(session, ticket.room_id, window).await?;
        let intervals = bookings.iter().map(Booking::interval).collect();

        Ok(self.apply_intervals(ticket, intervals))
    }

    /// Toggles the slot labelled `label`.
    pub fn toggle(&mut self, label: &str) -> BookingResult<Toggle> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.label == label)
            .ok_or_else(|| BookingError::NotFound(format!("No slot labelled {}", label)))?;

        self.selection.toggle(slot, &self.booked)
    }

    pub fn slot_views(&self) -> Vec<SlotView> {
        self.slots
            .iter()
            .map(|slot| SlotView {
                slot: slot.clone(),
                booked: is_booked(slot, &self.booked),
                selected: self.selection.contains(slot),
            })
            .collect()
    }

    /// Books the selected run of slots as one reservation.
    ///
    /// An empty or non-contiguous selection is rejected before any request
    /// is sent. On success the selection is cleared and the day's bookings
    /// are refetched; on failure the selection is kept so the user can
    /// adjust it.
    pub async fn submit<A>(
        &mut self,
        api: &A,
        session: &Session,
        reason: Option<String>,
    ) -> BookingResult<Booking>
    where
        A: BookingApi + ?Sized,
    {
        let room_id = self
            .room_id
            .ok_or_else(|| BookingError::Validation("Select a room first".to_string()))?;
        let span = self
            .selection
            .span()?
            .ok_or_else(|| BookingError::Validation("Select at least one slot".to_string()))?;

        let request = CreateBookingRequest::for_interval(room_id, span, reason);
        let booking = match api.create_booking(session, &request).await {
            Ok(booking) => booking,
            Err(e) => {
                warn!(room_id, error = %e, "booking rejected");
                return Err(e);
            }
        };
        info!(booking_id = booking.id, room_id, "slots booked");

        self.selection.clear();
        if let Err(e) = self.refresh(api, session).await {
            // The booking exists; only the grid is out of date.
            warn!(error = %e, "failed to refresh bookings after submit");
        }

        Ok(booking)
    }

    fn next_ticket(&mut self, room_id: RoomId) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            room_id,
            day: self.day,
            generation: self.generation,
        }
    }
}
