//! Writers for the reconciled crossing report.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use tollrec_core::{CorrelationResult, TripId};

use crate::cli::OutputFormat;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One report row, in the column order the billing team works with.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "Viaje")]
    trip_id: Option<&'a str>,
    #[serde(rename = "Tag")]
    tag: &'a str,
    #[serde(rename = "No.Economico")]
    vehicle: &'a str,
    #[serde(rename = "Fecha")]
    date: String,
    #[serde(rename = "Hora")]
    time: String,
    #[serde(rename = "Caseta")]
    booth: &'a str,
    #[serde(rename = "Carril")]
    lane: &'a str,
    #[serde(rename = "Clase")]
    class: u32,
    #[serde(rename = "Importe")]
    amount: Decimal,
    #[serde(rename = "Fecha Aplicacion")]
    application_date: String,
    #[serde(rename = "Hora Aplicacion")]
    application_time: String,
    #[serde(rename = "Consecar")]
    sequence_number: u64,
    #[serde(rename = "Fecha y Hora de Salida")]
    departure: Option<String>,
    #[serde(rename = "pase_datetime")]
    crossing_timestamp: String,
    #[serde(rename = "Ruta")]
    route: Option<&'a str>,
    #[serde(rename = "Resolucion")]
    resolution: &'static str,
}

impl<'a> ReportRow<'a> {
    fn new(result: &'a CorrelationResult) -> Self {
        let crossing = &result.crossing;
        Self {
            trip_id: result.trip_id.as_ref().map(TripId::as_str),
            tag: &crossing.tag,
            vehicle: &result.vehicle_display,
            date: crossing.date.format(DATE_FORMAT).to_string(),
            time: crossing.time.format(TIME_FORMAT).to_string(),
            booth: &crossing.booth,
            lane: &crossing.lane,
            class: crossing.class,
            amount: crossing.amount,
            application_date: crossing.application_date.format(DATE_FORMAT).to_string(),
            application_time: crossing.application_time.format(TIME_FORMAT).to_string(),
            sequence_number: crossing.sequence_number,
            departure: result
                .departure
                .map(|d| d.format(TIMESTAMP_FORMAT).to_string()),
            crossing_timestamp: result.crossing_timestamp.format(TIMESTAMP_FORMAT).to_string(),
            route: result.route.as_deref(),
            resolution: result.resolution.as_str(),
        }
    }
}

/// Writes `results` in the requested format.
pub fn write<W: Write>(writer: W, format: OutputFormat, results: &[CorrelationResult]) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(writer, results),
        OutputFormat::Json => write_json(writer, results),
    }
}

pub fn write_csv<W: Write>(writer: W, results: &[CorrelationResult]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for result in results {
        csv.serialize(ReportRow::new(result))
            .context("failed to write report row")?;
    }
    csv.flush().context("failed to flush report")?;
    Ok(())
}

pub fn write_json<W: Write>(mut writer: W, results: &[CorrelationResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, results).context("failed to write JSON report")?;
    writeln!(writer)?;
    Ok(())
}

/// Default report file name for a run started at `now`.
pub fn default_file_name(now: NaiveDateTime, format: OutputFormat) -> String {
    format!(
        "gmt_pase_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use tollrec_core::{CrossingEvent, EngineConfig, TripLog, TripRecord, VehicleId, correlate};

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn crossing(timestamp: &str, booth: &str, sequence_number: u64) -> CrossingEvent {
        let ts = at(timestamp);
        CrossingEvent {
            tag: "IMDM-7".to_string(),
            vehicle_id: VehicleId::new("2402").unwrap(),
            date: ts.date(),
            time: ts.time(),
            booth: booth.to_string(),
            lane: "A01".to_string(),
            class: 5,
            amount: Decimal::new(123_450, 2),
            application_date: ts.date(),
            application_time: ts.time(),
            sequence_number,
        }
    }

    fn results() -> Vec<CorrelationResult> {
        let trips = TripLog::new(vec![TripRecord::new(
            TripId::new("88120").unwrap(),
            VehicleId::new("2402").unwrap(),
            at("2025-01-10 08:00:00"),
            "MTY-SLP",
        )]);
        let crossings = vec![
            crossing("2025-01-10 07:00:00", "SALINAS", 1),
            crossing("2025-01-10 09:30:00", "SALINAS", 2),
        ];
        correlate(&trips, &crossings, &EngineConfig::default())
            .unwrap()
            .results
    }

    #[test]
    fn csv_report_keeps_column_order_and_blanks() {
        let mut output = Vec::new();
        write_csv(&mut output, &results()).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Viaje,Tag,No.Economico,Fecha,Hora,Caseta,Carril,Clase,Importe,Fecha Aplicacion,Hora Aplicacion,Consecar,Fecha y Hora de Salida,pase_datetime,Ruta,Resolucion
        ,IMDM-7,VELOX 2402,2025-01-10,07:00:00,SALINAS,A01,5,1234.50,2025-01-10,07:00:00,1,,2025-01-10 07:00:00,,unattributed
        88120,IMDM-7,VELOX 2402,2025-01-10,09:30:00,SALINAS,A01,5,1234.50,2025-01-10,09:30:00,2,2025-01-10 08:00:00,2025-01-10 09:30:00,MTY-SLP,single_trip
        ");
    }

    #[test]
    fn json_report_lists_every_result() {
        let mut output = Vec::new();
        write_json(&mut output, &results()).unwrap();

        let parsed: Vec<CorrelationResult> = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed, results());
    }

    #[test]
    fn default_file_name_uses_run_timestamp() {
        let now = NaiveDate::from_ymd_opt(2025, 2, 3)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap();

        assert_eq!(
            default_file_name(now, OutputFormat::Csv),
            "gmt_pase_20250203_140509.csv"
        );
        assert_eq!(
            default_file_name(now, OutputFormat::Json),
            "gmt_pase_20250203_140509.json"
        );
    }
}
