//! Check command for summarizing both logs before a reconciliation.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use tollrec_core::{CrossingEvent, TripLog, TripRecord};

use crate::Config;
use crate::normalize;

pub fn run<W: Write>(writer: &mut W, config: &Config, trips: &Path, crossings: &Path) -> Result<()> {
    let trips = normalize::read_trip_log(trips, &config.fleet_filter())?;
    let crossings = normalize::read_crossing_log(crossings)?;
    describe(writer, &trips, &crossings, config.start_date)
}

fn describe<W: Write>(
    writer: &mut W,
    trips: &TripLog,
    crossings: &[CrossingEvent],
    start: NaiveDate,
) -> Result<()> {
    let trip_ids: BTreeSet<_> = trips.records.iter().map(|t| &t.trip_id).collect();
    let trip_vehicles: BTreeSet<_> = trips.records.iter().map(|t| &t.vehicle_id).collect();
    writeln!(writer, "Trip log")?;
    writeln!(
        writer,
        "- {} legs, {} trips, {} vehicles",
        trips.records.len(),
        trip_ids.len(),
        trip_vehicles.len()
    )?;
    write_range(writer, trips.records.iter().map(TripRecord::date))?;

    let crossing_vehicles: BTreeSet<_> = crossings.iter().map(|c| &c.vehicle_id).collect();
    writeln!(writer, "Crossing log")?;
    writeln!(
        writer,
        "- {} crossings, {} vehicles",
        crossings.len(),
        crossing_vehicles.len()
    )?;
    write_range(writer, crossings.iter().map(|c| c.date))?;

    let without_trips: Vec<_> = crossing_vehicles.difference(&trip_vehicles).collect();
    if !without_trips.is_empty() {
        let ids: Vec<_> = without_trips.iter().map(|v| v.as_str()).collect();
        writeln!(writer, "Vehicles without trips: {}", ids.join(", "))?;
    }

    let (scoped_trips, scoped_crossings) =
        normalize::scope(trips.clone(), crossings.to_vec(), start);
    writeln!(
        writer,
        "In scope from {start}: {} legs, {} crossings",
        scoped_trips.records.len(),
        scoped_crossings.len()
    )?;
    Ok(())
}

fn write_range<W: Write>(writer: &mut W, dates: impl Iterator<Item = NaiveDate>) -> Result<()> {
    let dates: BTreeSet<NaiveDate> = dates.collect();
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => writeln!(writer, "- dates {first} to {last}")?,
        _ => writeln!(writer, "- no records")?,
    }
    Ok(())
}
