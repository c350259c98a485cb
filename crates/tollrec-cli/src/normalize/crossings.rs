//! Crossing log normalization.

use std::io::Read;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;

use tollrec_core::CrossingEvent;

use super::{csv_reader, unit_number};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

#[derive(Debug, Deserialize)]
struct CrossingRow {
    #[serde(rename = "Tag")]
    tag: String,
    #[serde(rename = "No.Economico")]
    vehicle: String,
    #[serde(rename = "Fecha")]
    date: String,
    #[serde(rename = "Hora")]
    time: String,
    #[serde(rename = "Caseta")]
    booth: String,
    #[serde(rename = "Carril")]
    lane: String,
    #[serde(rename = "Clase")]
    class: u32,
    #[serde(rename = "Importe")]
    amount: String,
    #[serde(rename = "Fecha Aplicacion")]
    application_date: String,
    #[serde(rename = "Hora Aplicacion")]
    application_time: String,
    #[serde(rename = "Consecar")]
    sequence_number: u64,
}

impl CrossingRow {
    fn into_event(self) -> Result<CrossingEvent> {
        let vehicle_id =
            unit_number(&self.vehicle).ok_or_else(|| anyhow!("invalid vehicle {:?}", self.vehicle))?;
        Ok(CrossingEvent {
            tag: self.tag,
            vehicle_id,
            date: parse_date(&self.date)?,
            time: parse_time(&self.time)?,
            booth: self.booth,
            lane: self.lane,
            class: self.class,
            amount: parse_amount(&self.amount)?,
            application_date: parse_date(&self.application_date)?,
            application_time: parse_time(&self.application_time)?,
            sequence_number: self.sequence_number,
        })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).with_context(|| format!("invalid date {value:?}"))
}

/// Parses a time of day with or without seconds.
fn parse_time(value: &str) -> Result<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
        .ok_or_else(|| anyhow!("invalid time {value:?}"))
}

/// Parses a currency amount such as `$1,234.50`.
fn parse_amount(value: &str) -> Result<Decimal> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    Decimal::from_str(&digits).with_context(|| format!("invalid amount {value:?}"))
}

/// Parses a crossing log export, sorted by date, time and vehicle.
pub fn load_crossings<R: Read>(reader: R) -> Result<Vec<CrossingEvent>> {
    let mut crossings = Vec::new();
    for (idx, row) in csv_reader(reader).deserialize::<CrossingRow>().enumerate() {
        let line = idx + 2;
        let event = row
            .map_err(anyhow::Error::from)
            .and_then(CrossingRow::into_event)
            .with_context(|| format!("malformed crossing log row {line}"))?;
        crossings.push(event);
    }
    crossings.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
    });

    tracing::info!(crossings = crossings.len(), "loaded crossing log");
    Ok(crossings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Tag,No.Economico,Fecha,Hora,Caseta,Carril,Clase,Importe,Fecha Aplicacion,Hora Aplicacion,Consecar\n";

    #[test]
    fn test_load_parses_and_sorts() {
        let input = format!(
            "{HEADER}\
IMDM-1,2417,10/01/2025,09:15:00, LINCOLN ,B04,5,\"$1,234.50\",11/01/2025,02:00:00,77
IMDM-2,2402,10/01/2025,09:15,SALINAS,A01,9,$98.00,11/01/2025,02:00,12
IMDM-3,2402,09/01/2025,23:59:59,SALINAS,A01,5,$98.00,10/01/2025,01:00:00,3
"
        );

        let crossings = load_crossings(input.as_bytes()).unwrap();

        let order: Vec<_> = crossings.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(order, vec!["IMDM-3", "IMDM-2", "IMDM-1"]);

        let lincoln = &crossings[2];
        assert_eq!(lincoln.booth, "LINCOLN");
        assert_eq!(lincoln.amount, Decimal::new(123_450, 2));
        assert_eq!(lincoln.class, 5);
        assert_eq!(lincoln.sequence_number, 77);
        assert_eq!(
            crossings[1].time,
            NaiveTime::from_hms_opt(9, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_amount_strips_currency() {
        assert_eq!(parse_amount("$1,234.50").unwrap(), Decimal::new(123_450, 2));
        assert_eq!(parse_amount("98").unwrap(), Decimal::new(98, 0));
        assert!(parse_amount("n/a").is_err());
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let input = format!(
            "{HEADER}\
IMDM-1,2402,10/01/2025,09:15:00,SALINAS,A01,5,$98.00,10/01/2025,10:00:00,1
IMDM-2,2402,2025-01-10,09:15:00,SALINAS,A01,5,$98.00,10/01/2025,10:00:00,2
"
        );

        let err = load_crossings(input.as_bytes()).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("row 3"), "{message}");
        assert!(message.contains("2025-01-10"), "{message}");
    }
}
