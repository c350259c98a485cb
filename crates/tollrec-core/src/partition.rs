//! Grouping of trips and crossings by vehicle and calendar date.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::crossing::CrossingEvent;
use crate::trip::TripRecord;
use crate::types::VehicleId;

/// How a crossing's calendar date relates to the vehicle's trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    /// Exactly one trip departed that day.
    SingleTrip,
    /// Two or more trips departed that day.
    MultiTrip,
    /// No trip departed that day.
    Unscheduled,
}

/// All trips and crossings of one vehicle.
#[derive(Debug, Clone, Default)]
pub struct VehicleBatch<'a> {
    pub trips: Vec<&'a TripRecord>,
    pub crossings: Vec<&'a CrossingEvent>,
}

/// Groups both logs by vehicle.
///
/// Vehicles that appear only in the crossing log get a batch with no trips,
/// so every crossing is routed somewhere.
pub fn group_by_vehicle<'a>(
    trips: &'a [TripRecord],
    crossings: &'a [CrossingEvent],
) -> BTreeMap<&'a VehicleId, VehicleBatch<'a>> {
    let mut batches: BTreeMap<&VehicleId, VehicleBatch<'_>> = BTreeMap::new();
    for trip in trips {
        batches.entry(&trip.vehicle_id).or_default().trips.push(trip);
    }
    for crossing in crossings {
        batches
            .entry(&crossing.vehicle_id)
            .or_default()
            .crossings
            .push(crossing);
    }
    batches
}

/// One vehicle's crossings split by the kind of their date.
#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    pub trips_by_date: BTreeMap<NaiveDate, Vec<&'a TripRecord>>,
    pub single_trip: Vec<&'a CrossingEvent>,
    pub multi_trip: Vec<&'a CrossingEvent>,
    pub unscheduled: Vec<&'a CrossingEvent>,
}

impl<'a> Partition<'a> {
    /// Trips (legs) that departed on `date`.
    pub fn trips_on(&self, date: NaiveDate) -> &[&'a TripRecord] {
        self.trips_by_date.get(&date).map_or(&[][..], Vec::as_slice)
    }

    /// Classifies `date` by its number of distinct trips.
    pub fn date_kind(&self, date: NaiveDate) -> DateKind {
        match distinct_trip_count(self.trips_on(date)) {
            0 => DateKind::Unscheduled,
            1 => DateKind::SingleTrip,
            _ => DateKind::MultiTrip,
        }
    }

    /// Distinct crossing dates that have no trip.
    pub fn unscheduled_dates(&self) -> BTreeSet<NaiveDate> {
        self.unscheduled.iter().map(|c| c.date).collect()
    }

    /// Distinct crossing dates that have two or more trips.
    pub fn multi_trip_dates(&self) -> BTreeSet<NaiveDate> {
        self.multi_trip.iter().map(|c| c.date).collect()
    }

    pub fn crossing_count(&self) -> usize {
        self.single_trip.len() + self.multi_trip.len() + self.unscheduled.len()
    }
}

/// Splits one vehicle's crossings into single-trip, multi-trip and
/// unscheduled dates.
pub fn partition<'a>(trips: &[&'a TripRecord], crossings: &[&'a CrossingEvent]) -> Partition<'a> {
    let mut result = Partition::default();
    for &trip in trips {
        result.trips_by_date.entry(trip.date()).or_default().push(trip);
    }

    for &crossing in crossings {
        match result.date_kind(crossing.date) {
            DateKind::SingleTrip => result.single_trip.push(crossing),
            DateKind::MultiTrip => result.multi_trip.push(crossing),
            DateKind::Unscheduled => result.unscheduled.push(crossing),
        }
    }

    tracing::debug!(
        dates_with_trips = result.trips_by_date.len(),
        single_trip = result.single_trip.len(),
        multi_trip = result.multi_trip.len(),
        unscheduled = result.unscheduled.len(),
        "partitioned crossings by date"
    );
    result
}

fn distinct_trip_count(trips: &[&TripRecord]) -> usize {
    trips
        .iter()
        .map(|t| &t.trip_id)
        .collect::<HashSet<_>>()
        .len()
}

/// Compares the distinct trip ids in `trips` with the count the normalizer
/// selected. Logs a warning and returns false on mismatch.
pub fn check_trip_count(trips: &[TripRecord], expected: Option<usize>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    let actual = trips
        .iter()
        .map(|t| &t.trip_id)
        .collect::<HashSet<_>>()
        .len();
    if actual == expected {
        tracing::debug!(trips = actual, "trip count matches fleet selection");
        true
    } else {
        tracing::warn!(
            expected,
            actual,
            "distinct trip count differs from fleet selection"
        );
        false
    }
}
