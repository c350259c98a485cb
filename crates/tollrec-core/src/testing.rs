//! Fixtures shared by the unit tests.

use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::crossing::CrossingEvent;
use crate::trip::TripRecord;
use crate::types::{TripId, VehicleId};

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid test timestamp")
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M:%S").expect("valid test time")
}

pub fn trip_id(id: &str) -> TripId {
    TripId::new(id).expect("valid trip id")
}

pub fn trip(id: &str, vehicle: &str, departure: &str) -> TripRecord {
    TripRecord::new(
        trip_id(id),
        VehicleId::new(vehicle).expect("valid vehicle id"),
        at(departure),
        format!("ROUTE-{id}"),
    )
}

pub fn crossing(vehicle: &str, timestamp: &str, booth: &str) -> CrossingEvent {
    let ts = at(timestamp);
    CrossingEvent {
        tag: format!("TAG-{vehicle}"),
        vehicle_id: VehicleId::new(vehicle).expect("valid vehicle id"),
        date: ts.date(),
        time: ts.time(),
        booth: booth.to_string(),
        lane: "A01".to_string(),
        class: 5,
        amount: Decimal::new(12_300, 2),
        application_date: ts.date(),
        application_time: ts.time(),
        sequence_number: 1,
    }
}
