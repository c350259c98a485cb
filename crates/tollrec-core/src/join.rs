//! Attaches route data and display fields to resolved crossings.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::attribution::Attributed;
use crate::engine::{CorrelationResult, EngineConfig};
use crate::trip::TripRecord;
use crate::types::TripId;

/// Route lookup keyed by trip id and leg departure.
///
/// A trip id can repeat across unit legs, so the departure timestamp is part
/// of the key. The first record wins when a key repeats.
#[derive(Debug, Default)]
pub struct RouteIndex<'a> {
    routes: HashMap<(TripId, NaiveDateTime), &'a str>,
}

impl<'a> RouteIndex<'a> {
    pub fn new(trips: &[&'a TripRecord]) -> Self {
        let mut routes = HashMap::with_capacity(trips.len());
        for &trip in trips {
            routes
                .entry((trip.trip_id.clone(), trip.departure))
                .or_insert(trip.route.as_str());
        }
        Self { routes }
    }

    pub fn route(&self, trip_id: &TripId, departure: NaiveDateTime) -> Option<&'a str> {
        self.routes.get(&(trip_id.clone(), departure)).copied()
    }
}

/// Converts resolved records into final results.
pub fn join(
    records: Vec<Attributed<'_>>,
    routes: &RouteIndex<'_>,
    config: &EngineConfig,
) -> Vec<CorrelationResult> {
    records
        .into_iter()
        .map(|record| {
            let route = match (&record.trip_id, record.departure) {
                (Some(trip_id), Some(departure)) => {
                    routes.route(trip_id, departure).map(str::to_string)
                }
                _ => None,
            };
            let crossing = record.crossing;
            CorrelationResult {
                vehicle_display: crossing
                    .vehicle_id
                    .display_with_fleet(config.fleet_code_prefix, &config.fleet_display_name),
                crossing_timestamp: crossing.timestamp(),
                crossing: crossing.clone(),
                trip_id: record.trip_id,
                departure: record.departure,
                route,
                resolution: record.resolution,
                departure_carried_forward: record.departure_carried_forward,
            }
        })
        .collect()
}
