//! Trip records - vehicle departures from the trip log.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::types::{TripId, VehicleId};

/// One departure leg of a trip, as produced by the trip log normalizer.
///
/// The calendar date and time of day are derived from `departure`, so the
/// three views of the departure can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    /// The trip (document) identifier.
    pub trip_id: TripId,
    /// The vehicle that made this leg.
    pub vehicle_id: VehicleId,
    /// When this leg departed.
    pub departure: NaiveDateTime,
    /// Route label of the trip.
    pub route: String,
    /// Earliest departure of any unit leg sharing this trip id.
    pub first_leg_departure: NaiveDateTime,
    /// Latest departure of any unit leg sharing this trip id.
    pub last_leg_departure: NaiveDateTime,
}

impl TripRecord {
    /// Creates a single-leg trip record whose leg window is its own departure.
    pub fn new(
        trip_id: TripId,
        vehicle_id: VehicleId,
        departure: NaiveDateTime,
        route: impl Into<String>,
    ) -> Self {
        Self {
            trip_id,
            vehicle_id,
            departure,
            route: route.into(),
            first_leg_departure: departure,
            last_leg_departure: departure,
        }
    }

    /// Calendar day of the departure.
    pub const fn date(&self) -> NaiveDate {
        self.departure.date()
    }

    /// Time of day of the departure.
    pub const fn departure_time(&self) -> NaiveTime {
        self.departure.time()
    }
}

/// The normalized trip log handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripLog {
    pub records: Vec<TripRecord>,
    /// Number of distinct fleet trips the normalizer selected, if known.
    pub expected_trip_count: Option<usize>,
}

impl TripLog {
    pub const fn new(records: Vec<TripRecord>) -> Self {
        Self {
            records,
            expected_trip_count: None,
        }
    }

    #[must_use]
    pub const fn with_expected_trip_count(mut self, count: usize) -> Self {
        self.expected_trip_count = Some(count);
        self
    }
}
