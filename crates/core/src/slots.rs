//! # Slot Generation
//!
//! Builds the catalog of bookable slots for one day of a room and answers
//! whether a slot collides with an existing booking.
//!
//! A day is described by a [`SlotWindow`] (`06:00` to `24:00` in 30 minute
//! steps by default) interpreted in the room's time zone. Slots are stepped
//! on the absolute timeline, so each one lasts exactly one step even on days
//! with a daylight-saving transition; only the labels follow the wall clock.
//! When the clocks fall back, slots starting in the repeated hour carry their
//! UTC offset, e.g. `01:00-01:30 (-04:00)` and `01:00-01:30 (-05:00)`, so
//! every label of a day is unique.

use std::{fmt, iter::FusedIterator, str::FromStr};

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

pub const DEFAULT_DAY_START: DayBoundary = DayBoundary(6 * 60);
pub const DEFAULT_DAY_END: DayBoundary = DayBoundary::END_OF_DAY;
pub const DEFAULT_STEP_MINUTES: u32 = 30;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// A wall-clock boundary within a day, stored as minutes past midnight.
///
/// Unlike [`chrono::NaiveTime`] this accepts `24:00`, the midnight that
/// closes the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayBoundary(u32);

impl DayBoundary {
    pub const MIDNIGHT: DayBoundary = DayBoundary(0);
    pub const END_OF_DAY: DayBoundary = DayBoundary(MINUTES_PER_DAY);

    pub fn new(hour: u32, minute: u32) -> BookingResult<Self> {
        if minute >= 60 || hour > 24 || (hour == 24 && minute != 0) {
            return Err(BookingError::Validation(format!(
                "{:02}:{:02} is not a valid time of day",
                hour, minute
            )));
        }
        Ok(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl FromStr for DayBoundary {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BookingError::Validation(format!("Expected HH:mm, got '{}'", s));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour = hour.parse::<u32>().map_err(|_| invalid())?;
        let minute = minute.parse::<u32>().map_err(|_| invalid())?;

        Self::new(hour, minute)
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// The bookable part of a day and the slot length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    start: DayBoundary,
    end: DayBoundary,
    step_minutes: u32,
}

impl SlotWindow {
    pub fn new(start: DayBoundary, end: DayBoundary, step_minutes: u32) -> BookingResult<Self> {
        if step_minutes == 0 {
            return Err(BookingError::Validation(
                "Slot length must be at least one minute".to_string(),
            ));
        }
        if start >= end {
            return Err(BookingError::Validation(format!(
                "Day window start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self {
            start,
            end,
            step_minutes,
        })
    }

    /// Builds a window from `HH:mm` strings.
    pub fn parse(start: &str, end: &str, step_minutes: u32) -> BookingResult<Self> {
        Self::new(start.parse()?, end.parse()?, step_minutes)
    }

    pub fn start(&self) -> DayBoundary {
        self.start
    }

    pub fn end(&self) -> DayBoundary {
        self.end
    }

    pub fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.step_minutes))
    }

    /// Number of whole slots that fit; a trailing partial slot is dropped.
    pub fn slot_count(&self) -> usize {
        ((self.end.0 - self.start.0) / self.step_minutes) as usize
    }
}

impl Default for SlotWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_DAY_START,
            end: DEFAULT_DAY_END,
            step_minutes: DEFAULT_STEP_MINUTES,
        }
    }
}

/// A reservation already held by the backend, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BookingInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// One selectable slot, `[start, end)`, labelled `HH:mm-HH:mm` in local time.
///
/// Labels are unique within a day and identify the slot to select.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
}

impl TimeSlot {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Strict overlap; a booking that ends exactly when the slot starts does not count.
    pub fn overlaps(&self, interval: &BookingInterval) -> bool {
        self.start < interval.end && self.end > interval.start
    }

    pub fn interval(&self) -> BookingInterval {
        BookingInterval::new(self.start, self.end)
    }
}

/// Lazy sequence of the slots of one day. Clone it to restart.
#[derive(Debug, Clone)]
pub struct SlotIter {
    next_start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    tz: Tz,
}

impl Iterator for SlotIter {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start;
        let end = start + self.step;
        if end > self.end {
            return None;
        }
        self.next_start = end;

        Some(TimeSlot {
            start,
            end,
            label: slot_label(start, end, self.tz),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next_start).num_minutes().max(0);
        let step = self.step.num_minutes().max(1);
        let n = (remaining / step) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SlotIter {}

impl FusedIterator for SlotIter {}

/// Generates the slots of `day` in `tz` covering `window`.
pub fn generate_slots(day: NaiveDate, tz: Tz, window: &SlotWindow) -> SlotIter {
    SlotIter {
        next_start: boundary_instant(day, window.start, tz),
        end: boundary_instant(day, window.end, tz),
        step: window.step(),
        tz,
    }
}

/// True iff `slot` strictly overlaps any of `booked`.
pub fn is_booked(slot: &TimeSlot, booked: &[BookingInterval]) -> bool {
    booked.iter().any(|interval| slot.overlaps(interval))
}

/// The whole calendar day in `tz`, from local midnight to the next one.
pub fn day_bounds(day: NaiveDate, tz: Tz) -> BookingInterval {
    BookingInterval::new(
        boundary_instant(day, DayBoundary::MIDNIGHT, tz),
        boundary_instant(day, DayBoundary::END_OF_DAY, tz),
    )
}

fn boundary_instant(day: NaiveDate, boundary: DayBoundary, tz: Tz) -> DateTime<Utc> {
    let naive = day.and_hms_opt(0, 0, 0).unwrap_or_default()
        + Duration::minutes(i64::from(boundary.minutes()));
    resolve_local(naive, tz)
}

// Wall-clock times inside a spring-forward gap resolve to the first instant after it.
fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn slot_label(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> String {
    let local_start = start.with_timezone(&tz);
    let local_end = end.with_timezone(&tz);

    let end_label = if local_end.date_naive() > local_start.date_naive()
        && local_end.hour() == 0
        && local_end.minute() == 0
    {
        "24:00".to_string()
    } else {
        local_end.format("%H:%M").to_string()
    };

    let label = format!("{}-{}", local_start.format("%H:%M"), end_label);
    match tz.from_local_datetime(&local_start.naive_local()) {
        LocalResult::Ambiguous(..) => format!("{} ({})", label, local_start.format("%:z")),
        _ => label,
    }
}
