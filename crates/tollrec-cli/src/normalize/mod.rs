//! Loading of the vendor CSV logs into core records.
//!
//! Both logs are read with headers and every field trimmed. Missing columns
//! or malformed values fail the load with the offending row number.

mod crossings;
mod trips;

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use regex::Regex;

use tollrec_core::{CrossingEvent, TripLog, TripRecord, VehicleId};

pub use crossings::load_crossings;
pub use trips::load_trips;

/// Pre-compiled regex for the numeric part of a unit label.
static UNIT_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("unit number pattern is valid"));

/// Selects the fleet's units in the trip log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetFilter {
    /// Units whose label contains this marker belong to the fleet.
    pub marker: String,
    /// Units listed here belong to the fleet regardless of their label.
    pub extra_units: Vec<String>,
}

impl FleetFilter {
    pub fn is_fleet_unit(&self, unit: &str) -> bool {
        (!self.marker.is_empty() && unit.contains(&self.marker))
            || self.extra_units.iter().any(|extra| extra == unit)
    }
}

/// Extracts the vehicle id from a unit label (`VELOX 2402` → `2402`).
fn unit_number(label: &str) -> Option<VehicleId> {
    UNIT_NUMBER_RE
        .find(label)
        .and_then(|m| VehicleId::new(m.as_str()).ok())
}

fn csv_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Workbook extensions that must be exported to CSV before loading.
const WORKBOOK_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "xls"];

/// Fails on workbook files, which the CSV loaders cannot read.
fn ensure_csv(path: &Path, log: &str) -> Result<()> {
    let workbook = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)));
    if workbook {
        bail!(
            "{log} {} is a spreadsheet workbook; export the sheet as CSV first",
            path.display()
        );
    }
    Ok(())
}

/// Reads and normalizes the trip log at `path`.
pub fn read_trip_log(path: &Path, fleet: &FleetFilter) -> Result<TripLog> {
    ensure_csv(path, "trip log")?;
    let file =
        File::open(path).with_context(|| format!("failed to open trip log {}", path.display()))?;
    load_trips(file, fleet).with_context(|| format!("failed to load trip log {}", path.display()))
}

/// Reads and normalizes the crossing log at `path`.
pub fn read_crossing_log(path: &Path) -> Result<Vec<CrossingEvent>> {
    ensure_csv(path, "crossing log")?;
    let file = File::open(path)
        .with_context(|| format!("failed to open crossing log {}", path.display()))?;
    load_crossings(file)
        .with_context(|| format!("failed to load crossing log {}", path.display()))
}

/// Restricts both logs to the reconciliation period.
///
/// Trips before `start` are dropped. Crossings before `start` or after the
/// last remaining trip date are dropped; with no trips left, no crossing is.
pub fn scope(
    mut trips: TripLog,
    mut crossings: Vec<CrossingEvent>,
    start: NaiveDate,
) -> (TripLog, Vec<CrossingEvent>) {
    let trips_before = trips.records.len();
    let ids_before = distinct_trip_ids(&trips.records);
    trips.records.retain(|t| t.date() >= start);
    // Trips that lost every leg no longer count towards the fleet selection.
    let ids_dropped = ids_before - distinct_trip_ids(&trips.records);
    trips.expected_trip_count = trips
        .expected_trip_count
        .map(|count| count.saturating_sub(ids_dropped));
    let last_trip_date = trips.records.iter().map(TripRecord::date).max();

    let crossings_before = crossings.len();
    crossings.retain(|c| c.date >= start && last_trip_date.is_some_and(|last| c.date <= last));

    tracing::info!(
        %start,
        last_trip_date = ?last_trip_date,
        trips = trips.records.len(),
        trips_dropped = trips_before - trips.records.len(),
        crossings = crossings.len(),
        crossings_dropped = crossings_before - crossings.len(),
        "scoped logs to reconciliation period"
    );
    (trips, crossings)
}

fn distinct_trip_ids(records: &[TripRecord]) -> usize {
    records
        .iter()
        .map(|r| &r.trip_id)
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet() -> FleetFilter {
        FleetFilter {
            marker: "VELOX".to_string(),
            extra_units: vec!["3502".to_string()],
        }
    }

    #[test]
    fn test_fleet_filter_matches_marker_and_extra_units() {
        let fleet = fleet();

        assert!(fleet.is_fleet_unit("VELOX 2402"));
        assert!(fleet.is_fleet_unit("3502"));
        assert!(!fleet.is_fleet_unit("GMT 1180"));
        assert!(!fleet.is_fleet_unit("35021"));
    }

    #[test]
    fn test_unit_number_takes_first_digit_run() {
        assert_eq!(unit_number("VELOX 2402").unwrap().as_str(), "2402");
        assert_eq!(unit_number("2402.0").unwrap().as_str(), "2402");
        assert!(unit_number("VELOX").is_none());
    }

    #[test]
    fn test_workbook_trip_log_is_rejected_with_hint() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("viajes.XLSX");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let err = read_trip_log(&path, &fleet()).unwrap_err();

        assert!(err.to_string().contains("export the sheet as CSV"), "{err}");
        assert!(read_crossing_log(&temp.path().join("pase.xls")).is_err());
    }

    #[test]
    fn test_scope_drops_records_outside_period() {
        let trips = load_trips(
            "Viaje Docto.,Tractocamión,Fecha y Hora de Salida,Ruta\n\
             1,VELOX 2402,28/12/2024 08:00:00,A\n\
             2,VELOX 2402,10/01/2025 08:00:00,B\n"
                .as_bytes(),
            &fleet(),
        )
        .unwrap();
        let crossings = load_crossings(
            "Tag,No.Economico,Fecha,Hora,Caseta,Carril,Clase,Importe,Fecha Aplicacion,Hora Aplicacion,Consecar\n\
             T,2402,30/12/2024,09:00:00,SALINAS,A1,5,$10.00,30/12/2024,10:00:00,1\n\
             T,2402,10/01/2025,09:00:00,SALINAS,A1,5,$10.00,10/01/2025,10:00:00,2\n\
             T,2402,11/01/2025,09:00:00,SALINAS,A1,5,$10.00,11/01/2025,10:00:00,3\n"
                .as_bytes(),
        )
        .unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let (trips, crossings) = scope(trips, crossings, start);

        assert_eq!(trips.records.len(), 1);
        assert_eq!(trips.records[0].trip_id.as_str(), "2");
        assert_eq!(trips.expected_trip_count, Some(1));
        let sequences: Vec<_> = crossings.iter().map(|c| c.sequence_number).collect();
        assert_eq!(sequences, vec![2]);
    }
}
