//! # Slot Selection
//!
//! Tracks the slots a user has picked for the current room and day and
//! checks that they form one uninterrupted run before a booking is sent.

use crate::{
    errors::{BookingError, BookingResult},
    slots::{is_booked, BookingInterval, TimeSlot},
};

/// Outcome of a successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected,
    Deselected,
}

/// The pending selection, always ordered by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    slots: Vec<TimeSlot>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, slot: &TimeSlot) -> bool {
        self.position(slot).is_ok()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Adds `slot` if absent, removes it if present.
    ///
    /// Slots overlapping any of `booked` are refused with
    /// [`BookingError::NotSelectable`] and the selection is left untouched.
    pub fn toggle(&mut self, slot: &TimeSlot, booked: &[BookingInterval]) -> BookingResult<Toggle> {
        if is_booked(slot, booked) {
            return Err(BookingError::NotSelectable(slot.label.clone()));
        }

        match self.position(slot) {
            Ok(index) => {
                self.slots.remove(index);
                Ok(Toggle::Deselected)
            }
            Err(index) => {
                self.slots.insert(index, slot.clone());
                Ok(Toggle::Selected)
            }
        }
    }

    pub fn validate_contiguous(&self) -> BookingResult<()> {
        validate_contiguous(&self.slots)
    }

    /// The single interval covered by the selection, or `None` when empty.
    pub fn span(&self) -> BookingResult<Option<BookingInterval>> {
        self.validate_contiguous()?;
        Ok(match (self.slots.first(), self.slots.last()) {
            (Some(first), Some(last)) => Some(BookingInterval::new(first.start, last.end)),
            _ => None,
        })
    }

    fn position(&self, slot: &TimeSlot) -> Result<usize, usize> {
        self.slots
            .binary_search_by(|s| (s.start, s.end).cmp(&(slot.start, slot.end)))
    }
}

/// Returns `selection` with `slot` toggled. Booked slots are ignored.
pub fn toggle_slot(
    slot: &TimeSlot,
    mut selection: SelectionSet,
    booked: &[BookingInterval],
) -> SelectionSet {
    // Refusal leaves the selection as it was.
    let _ = selection.toggle(slot, booked);
    selection
}

/// Fails on the first adjacent pair of `slots` whose boundaries do not meet exactly.
pub fn validate_contiguous(slots: &[TimeSlot]) -> BookingResult<()> {
    match slots.windows(2).find(|pair| pair[0].end != pair[1].start) {
        Some(pair) => Err(BookingError::Contiguity {
            previous_end: pair[0].end,
            next_start: pair[1].start,
        }),
        None => Ok(()),
    }
}
