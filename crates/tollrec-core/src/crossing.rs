//! Toll crossings - booth charges from the toll log.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::VehicleId;

/// A single toll-booth charge, as produced by the crossing log normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingEvent {
    /// Toll tag that was charged.
    pub tag: String,
    /// Vehicle carrying the tag.
    pub vehicle_id: VehicleId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Booth label, trimmed by the normalizer.
    pub booth: String,
    pub lane: String,
    /// Vehicle class charged by the booth.
    pub class: u32,
    pub amount: Decimal,
    /// When the charge was applied to the account.
    pub application_date: NaiveDate,
    pub application_time: NaiveTime,
    /// Operator sequence number of the charge.
    pub sequence_number: u64,
}

impl CrossingEvent {
    /// When the vehicle passed the booth.
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Returns true if this crossing happened at `booth` (ASCII case-insensitive).
    pub fn is_at_booth(&self, booth: &str) -> bool {
        self.booth.eq_ignore_ascii_case(booth)
    }
}
