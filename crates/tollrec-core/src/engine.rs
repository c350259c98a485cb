//! Trip-crossing correlation pipeline.
//!
//! # Pipeline
//!
//! For each vehicle, independently:
//!
//! 1. Partition crossings by whether their date has one, several or no trips
//! 2. Assign single-trip dates directly and multi-trip dates by time window,
//!    dropping assignments where the crossing precedes the trip departure
//! 3. Resolve what is left against the vehicle-wide trip timeline
//! 4. Hand override-booth crossings the trip of the following crossing,
//!    then carry departures forward into the gaps
//! 5. Attach routes and display fields
//!
//! Vehicles run in parallel and are concatenated in vehicle-id order.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assign::assign;
use crate::booth::{apply_override, carry_forward_departures, chronological};
use crate::crossing::CrossingEvent;
use crate::fallback::{self, Timeline};
use crate::join::{RouteIndex, join};
use crate::partition::{VehicleBatch, check_trip_count, group_by_vehicle, partition};
use crate::trip::{TripLog, TripRecord};
use crate::types::{Resolution, TripId, ValidationError, VehicleId};

/// Errors that abort a correlation run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// The engine configuration is unusable.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
    /// A per-vehicle batch contained a record of another vehicle.
    #[error("batch for vehicle {expected} contains a {kind} of vehicle {found}")]
    VehicleMismatch {
        expected: VehicleId,
        found: VehicleId,
        kind: &'static str,
    },
}

/// Business settings of the correlation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Booth whose charges belong to the following crossing's trip.
    /// Default: `LINCOLN`.
    pub override_booth: String,

    /// Vehicle ids starting with this digit get the fleet display name.
    /// Default: `2`.
    pub fleet_code_prefix: char,

    /// Name shown before fleet vehicle ids. Default: `VELOX`.
    pub fleet_display_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            override_booth: "LINCOLN".to_string(),
            fleet_code_prefix: '2',
            fleet_display_name: "VELOX".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.override_booth.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "override booth",
            });
        }
        if !self.fleet_code_prefix.is_ascii_digit() {
            return Err(ValidationError::FleetPrefixNotDigit {
                value: self.fleet_code_prefix,
            });
        }
        if self.fleet_display_name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "fleet display name",
            });
        }
        Ok(())
    }
}

/// A crossing annotated with the trip it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationResult {
    #[serde(flatten)]
    pub crossing: CrossingEvent,
    /// Vehicle id as shown in reports (`VELOX 2402`).
    pub vehicle_display: String,
    pub crossing_timestamp: NaiveDateTime,
    /// Attributed trip; `None` means the crossing needs manual review.
    pub trip_id: Option<TripId>,
    /// Departure of the attributed trip leg.
    pub departure: Option<NaiveDateTime>,
    pub route: Option<String>,
    pub resolution: Resolution,
    /// `departure` was copied from an earlier crossing.
    #[serde(default)]
    pub departure_carried_forward: bool,
}

/// Counters describing a correlation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub vehicles: usize,
    pub crossings_in: usize,
    pub results_out: usize,
    pub attributed: usize,
    pub unattributed: usize,
    /// Provisional assignments dropped because the crossing preceded the departure.
    pub ordering_violations: usize,
    /// Distinct (vehicle, date) pairs with crossings but no trips.
    pub unscheduled_dates: usize,
    pub unscheduled_crossings: usize,
    /// Crossings earlier than every trip of their vehicle.
    pub unmatched: usize,
    pub departures_carried_forward: usize,
    pub by_resolution: BTreeMap<Resolution, usize>,
}

impl Diagnostics {
    /// Returns true if every input crossing produced exactly one result.
    pub const fn cardinality_holds(&self) -> bool {
        self.crossings_in == self.results_out
    }

    fn absorb(&mut self, other: &Self) {
        self.vehicles += other.vehicles;
        self.crossings_in += other.crossings_in;
        self.results_out += other.results_out;
        self.attributed += other.attributed;
        self.unattributed += other.unattributed;
        self.ordering_violations += other.ordering_violations;
        self.unscheduled_dates += other.unscheduled_dates;
        self.unscheduled_crossings += other.unscheduled_crossings;
        self.unmatched += other.unmatched;
        self.departures_carried_forward += other.departures_carried_forward;
        for (resolution, count) in &other.by_resolution {
            *self.by_resolution.entry(*resolution).or_insert(0) += count;
        }
    }
}

/// Results for a single vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleCorrelation {
    pub vehicle_id: VehicleId,
    /// Results in crossing date and time order.
    pub results: Vec<CorrelationResult>,
    pub diagnostics: Diagnostics,
}

/// Results for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    /// Results grouped by vehicle id, each vehicle in crossing order.
    pub results: Vec<CorrelationResult>,
    pub diagnostics: Diagnostics,
}

/// Correlates every crossing with a trip of the same vehicle.
///
/// Vehicles that only appear in the crossing log are processed too; their
/// crossings come back unattributed.
pub fn correlate(
    trips: &TripLog,
    crossings: &[CrossingEvent],
    config: &EngineConfig,
) -> Result<Correlation, CorrelationError> {
    config.validate()?;
    check_trip_count(&trips.records, trips.expected_trip_count);

    let batches: Vec<(&VehicleId, VehicleBatch<'_>)> =
        group_by_vehicle(&trips.records, crossings).into_iter().collect();
    tracing::debug!(vehicles = batches.len(), "correlating vehicles");

    let per_vehicle: Vec<VehicleCorrelation> = batches
        .par_iter()
        .map(|(vehicle_id, batch)| run_vehicle(vehicle_id, batch, config))
        .collect();

    let mut correlation = Correlation::default();
    for vehicle in per_vehicle {
        correlation.diagnostics.absorb(&vehicle.diagnostics);
        correlation.results.extend(vehicle.results);
    }
    let diagnostics = &mut correlation.diagnostics;
    diagnostics.crossings_in = crossings.len();
    diagnostics.results_out = correlation.results.len();

    if diagnostics.cardinality_holds() {
        tracing::info!(
            vehicles = diagnostics.vehicles,
            crossings = diagnostics.crossings_in,
            attributed = diagnostics.attributed,
            unattributed = diagnostics.unattributed,
            "correlation complete"
        );
    } else {
        tracing::error!(
            crossings = diagnostics.crossings_in,
            results = diagnostics.results_out,
            "result count differs from crossing count"
        );
    }
    Ok(correlation)
}

/// Correlates the crossings of one vehicle with its trips.
///
/// Every record must belong to `vehicle_id`; a foreign record rejects the
/// whole batch.
pub fn correlate_vehicle(
    vehicle_id: &VehicleId,
    trips: &[TripRecord],
    crossings: &[CrossingEvent],
    config: &EngineConfig,
) -> Result<VehicleCorrelation, CorrelationError> {
    config.validate()?;
    let mismatch = |found: &VehicleId, kind| CorrelationError::VehicleMismatch {
        expected: vehicle_id.clone(),
        found: found.clone(),
        kind,
    };
    if let Some(trip) = trips.iter().find(|t| &t.vehicle_id != vehicle_id) {
        return Err(mismatch(&trip.vehicle_id, "trip"));
    }
    if let Some(crossing) = crossings.iter().find(|c| &c.vehicle_id != vehicle_id) {
        return Err(mismatch(&crossing.vehicle_id, "crossing"));
    }

    let batch = VehicleBatch {
        trips: trips.iter().collect(),
        crossings: crossings.iter().collect(),
    };
    Ok(run_vehicle(vehicle_id, &batch, config))
}

fn run_vehicle(
    vehicle_id: &VehicleId,
    batch: &VehicleBatch<'_>,
    config: &EngineConfig,
) -> VehicleCorrelation {
    let partition = partition(&batch.trips, &batch.crossings);
    let unscheduled_dates = partition.unscheduled_dates().len();
    let unscheduled_crossings = partition.unscheduled.len();

    let provisional = assign(&partition);
    let ordering_violations = provisional.iter().filter(|r| r.precedes_departure).count();

    let timeline = Timeline::from_trips(&batch.trips);
    let resolved = fallback::resolve(provisional, &timeline);
    let unmatched = resolved.iter().filter(|r| !r.is_attributed()).count();

    let ordered = chronological(resolved);
    let overridden = apply_override(ordered, &config.override_booth);
    let filled = carry_forward_departures(overridden);
    let departures_carried_forward = filled.iter().filter(|r| r.departure_carried_forward).count();

    let routes = RouteIndex::new(&batch.trips);
    let results = join(filled, &routes, config);

    let mut by_resolution = BTreeMap::new();
    for result in &results {
        *by_resolution.entry(result.resolution).or_insert(0) += 1;
    }
    let attributed = results.iter().filter(|r| r.trip_id.is_some()).count();
    let diagnostics = Diagnostics {
        vehicles: 1,
        crossings_in: batch.crossings.len(),
        results_out: results.len(),
        attributed,
        unattributed: results.len() - attributed,
        ordering_violations,
        unscheduled_dates,
        unscheduled_crossings,
        unmatched,
        departures_carried_forward,
        by_resolution,
    };

    if diagnostics.cardinality_holds() {
        tracing::debug!(
            vehicle = %vehicle_id,
            crossings = diagnostics.crossings_in,
            attributed = diagnostics.attributed,
            "vehicle correlated"
        );
    } else {
        tracing::error!(
            vehicle = %vehicle_id,
            crossings = diagnostics.crossings_in,
            results = diagnostics.results_out,
            "vehicle result count differs from crossing count"
        );
    }

    VehicleCorrelation {
        vehicle_id: vehicle_id.clone(),
        results,
        diagnostics,
    }
}
