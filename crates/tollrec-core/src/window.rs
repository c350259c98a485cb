//! Time-of-day windows for days with more than one trip.
//!
//! Each trip owns the half-open window `[its departure, next departure)`;
//! the last trip of the day owns everything from its departure onwards.

use chrono::{NaiveDateTime, NaiveTime};

use crate::trip::TripRecord;
use crate::types::TripId;

/// A trip's window on a multi-trip date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripWindow {
    pub trip_id: TripId,
    pub start: NaiveTime,
    /// Exclusive end; `None` means unbounded for the rest of the day.
    pub end: Option<NaiveTime>,
    /// Departure timestamp of the leg that opened the window.
    pub departure: NaiveDateTime,
}

impl TripWindow {
    /// Returns true if `time` falls inside `[start, end)`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && self.end.is_none_or(|end| time < end)
    }
}

/// Builds the ordered, non-overlapping windows for one day's trips.
///
/// A trip id with several legs that day is represented by its earliest leg.
/// Trips sharing a departure time keep their input order; the first of them
/// owns the window and the rest get empty windows.
pub fn build_windows(trips: &[&TripRecord]) -> Vec<TripWindow> {
    // Earliest leg per trip id, in first-seen order.
    let mut earliest: Vec<&TripRecord> = Vec::new();
    for &trip in trips {
        match earliest.iter_mut().find(|t| t.trip_id == trip.trip_id) {
            Some(existing) if trip.departure_time() < existing.departure_time() => {
                *existing = trip;
            }
            Some(_) => {}
            None => earliest.push(trip),
        }
    }
    earliest.sort_by_key(|t| t.departure_time());

    let mut windows = Vec::with_capacity(earliest.len());
    for (idx, trip) in earliest.iter().enumerate() {
        let start = trip.departure_time();
        let tied_with_previous = idx > 0 && earliest[idx - 1].departure_time() == start;
        let end = if tied_with_previous {
            tracing::debug!(
                trip_id = %trip.trip_id,
                date = %trip.date(),
                %start,
                "trip shares departure time with an earlier trip, window left empty"
            );
            Some(start)
        } else {
            earliest[idx + 1..]
                .iter()
                .map(|t| t.departure_time())
                .find(|&next| next > start)
        };
        windows.push(TripWindow {
            trip_id: trip.trip_id.clone(),
            start,
            end,
            departure: trip.departure,
        });
    }
    windows
}

/// Finds the window containing `time`.
pub fn find_window(windows: &[TripWindow], time: NaiveTime) -> Option<&TripWindow> {
    windows.iter().find(|w| w.contains(time))
}
