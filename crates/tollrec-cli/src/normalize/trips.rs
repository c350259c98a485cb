//! Trip log normalization.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;

use tollrec_core::{TripId, TripLog, TripRecord};

use super::{FleetFilter, csv_reader, unit_number};

const DEPARTURE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Deserialize)]
struct TripRow {
    #[serde(rename = "Viaje Docto.", alias = "Viaje")]
    trip: String,
    #[serde(rename = "Tractocamión", alias = "Unidad")]
    unit: String,
    #[serde(rename = "Fecha y Hora de Salida", default)]
    departure: String,
    #[serde(rename = "Ruta", default)]
    route: String,
}

struct Leg {
    trip: String,
    unit: String,
    departure: NaiveDateTime,
    route: String,
}

/// Parses a trip log export and keeps the fleet's legs.
///
/// Every leg of a fleet trip, including legs of units outside the fleet,
/// widens that trip's first/last leg departure. Only fleet legs become
/// records. Rows without a departure are skipped and never make a trip
/// part of the fleet selection.
pub fn load_trips<R: Read>(reader: R, fleet: &FleetFilter) -> Result<TripLog> {
    let mut legs = Vec::new();
    let mut fleet_trips = BTreeSet::new();
    let mut undated = 0usize;

    for (idx, row) in csv_reader(reader).deserialize::<TripRow>().enumerate() {
        let line = idx + 2;
        let row = row.with_context(|| format!("malformed trip log row {line}"))?;
        if row.departure.is_empty() {
            undated += 1;
            continue;
        }
        if fleet.is_fleet_unit(&row.unit) {
            fleet_trips.insert(row.trip.clone());
        }
        let departure = NaiveDateTime::parse_from_str(&row.departure, DEPARTURE_FORMAT)
            .with_context(|| {
                format!(
                    "invalid departure {:?} in trip log row {line}",
                    row.departure
                )
            })?;
        legs.push(Leg {
            trip: row.trip,
            unit: row.unit,
            departure,
            route: row.route,
        });
    }
    if undated > 0 {
        tracing::debug!(rows = undated, "skipped trip log rows without departure");
    }

    let mut spans: HashMap<&str, (NaiveDateTime, NaiveDateTime)> = HashMap::new();
    for leg in legs.iter().filter(|l| fleet_trips.contains(&l.trip)) {
        spans
            .entry(leg.trip.as_str())
            .and_modify(|(first, last)| {
                *first = (*first).min(leg.departure);
                *last = (*last).max(leg.departure);
            })
            .or_insert((leg.departure, leg.departure));
    }
    if spans.len() != fleet_trips.len() {
        tracing::error!(
            fleet_trips = fleet_trips.len(),
            spans = spans.len(),
            "leg span aggregation lost fleet trips"
        );
    }

    let mut records = Vec::new();
    for leg in legs.iter().filter(|l| fleet.is_fleet_unit(&l.unit)) {
        let Some(vehicle_id) = unit_number(&leg.unit) else {
            tracing::warn!(unit = %leg.unit, trip = %leg.trip, "fleet unit without a number, leg skipped");
            continue;
        };
        let Some(&(first, last)) = spans.get(leg.trip.as_str()) else {
            continue;
        };
        let trip_id = TripId::new(leg.trip.as_str())
            .with_context(|| format!("invalid trip id for unit {}", leg.unit))?;
        records.push(TripRecord {
            first_leg_departure: first,
            last_leg_departure: last,
            ..TripRecord::new(trip_id, vehicle_id, leg.departure, leg.route.as_str())
        });
    }
    records.sort_by(|a, b| {
        a.departure
            .cmp(&b.departure)
            .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
    });

    tracing::info!(
        legs = records.len(),
        trips = fleet_trips.len(),
        "loaded trip log"
    );
    Ok(TripLog::new(records).with_expected_trip_count(fleet_trips.len()))
}
