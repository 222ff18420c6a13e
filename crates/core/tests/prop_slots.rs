//! Property-based tests for slot generation, overlap and selection.
//!
//! These check invariants that must hold for any day and any set of
//! bookings, complementing the fixed scenarios in `slots_test.rs` and
//! `selection_test.rs`.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;
use roombook_core::{
    generate_slots, is_booked, validate_contiguous, BookingInterval, SelectionSet, SlotWindow,
    TimeSlot,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_day() -> impl Strategy<Value = NaiveDate> {
    (2024i32..=2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_timezone() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(Tz::UTC),
        Just(Tz::Asia__Shanghai),
        Just(Tz::Europe__Berlin),
        Just(Tz::America__New_York),
        Just(Tz::Australia__Sydney),
    ]
}

/// Bookings on 2026-03-02 UTC, aligned to 5 minutes, 5 minutes to 4 hours long.
fn arb_interval() -> impl Strategy<Value = BookingInterval> {
    (0i64..288, 1i64..=48).prop_map(|(start, len)| {
        let midnight = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let start = midnight + Duration::minutes(start * 5);
        BookingInterval::new(start, start + Duration::minutes(len * 5))
    })
}

fn fixed_day_slots() -> Vec<TimeSlot> {
    let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    generate_slots(day, Tz::UTC, &SlotWindow::default()).collect()
}

fn overlaps_brute_force(slot: &TimeSlot, interval: &BookingInterval) -> bool {
    // Any shared minute means a conflict.
    let mut minute: DateTime<Utc> = slot.start;
    while minute < slot.end {
        if minute >= interval.start && minute < interval.end {
            return true;
        }
        minute += Duration::minutes(1);
    }
    false
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn test_default_day_is_covered_without_gaps(day in arb_day(), tz in arb_timezone()) {
        let slots: Vec<_> = generate_slots(day, tz, &SlotWindow::default()).collect();

        prop_assert!(!slots.is_empty());
        for slot in &slots {
            prop_assert_eq!(slot.duration(), Duration::minutes(30));
        }
        for pair in slots.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        let first = slots.first().unwrap();
        let last = slots.last().unwrap();
        prop_assert!(first.label.starts_with("06:00-"));
        prop_assert!(last.label.ends_with("-24:00"));
    }

    #[test]
    fn test_is_booked_matches_brute_force(
        intervals in prop::collection::vec(arb_interval(), 0..6),
        index in 0usize..36,
    ) {
        let slot = &fixed_day_slots()[index];
        let expected = intervals.iter().any(|i| overlaps_brute_force(slot, i));

        prop_assert_eq!(is_booked(slot, &intervals), expected);
    }

    #[test]
    fn test_toggle_twice_is_identity(
        picked in prop::collection::btree_set(0usize..36, 0..8),
        index in 0usize..36,
    ) {
        let slots = fixed_day_slots();
        let mut selection = SelectionSet::new();
        for i in &picked {
            selection.toggle(&slots[*i], &[]).unwrap();
        }
        let before = selection.clone();

        selection.toggle(&slots[index], &[]).unwrap();
        selection.toggle(&slots[index], &[]).unwrap();

        prop_assert_eq!(selection, before);
    }

    #[test]
    fn test_selection_stays_sorted(order in Just((0usize..36).collect::<Vec<_>>()).prop_shuffle()) {
        let slots = fixed_day_slots();
        let mut selection = SelectionSet::new();
        for i in order.iter().take(10) {
            selection.toggle(&slots[*i], &[]).unwrap();
        }

        for pair in selection.slots().windows(2) {
            prop_assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn test_contiguity_fails_iff_indices_have_a_gap(
        picked in prop::collection::btree_set(0usize..36, 0..8),
    ) {
        let slots = fixed_day_slots();
        let chosen: Vec<_> = picked.iter().map(|i| slots[*i].clone()).collect();
        let indices: Vec<_> = picked.iter().copied().collect();
        let has_gap = indices.windows(2).any(|w| w[1] != w[0] + 1);

        prop_assert_eq!(validate_contiguous(&chosen).is_err(), has_gap);
    }
}
