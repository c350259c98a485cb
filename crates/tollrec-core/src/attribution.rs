//! The working record passed between pipeline stages.

use chrono::NaiveDateTime;

use crate::crossing::CrossingEvent;
use crate::types::{Resolution, TripId};

/// A crossing together with its current trip attribution.
///
/// Each stage consumes a batch of these and returns a new batch; the
/// crossing itself is borrowed from the input and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributed<'a> {
    pub crossing: &'a CrossingEvent,
    pub trip_id: Option<TripId>,
    pub departure: Option<NaiveDateTime>,
    pub resolution: Resolution,
    /// The crossing happened before its provisional trip departed.
    pub precedes_departure: bool,
    /// `departure` was copied from an earlier crossing.
    pub departure_carried_forward: bool,
}

impl<'a> Attributed<'a> {
    pub const fn unattributed(crossing: &'a CrossingEvent) -> Self {
        Self {
            crossing,
            trip_id: None,
            departure: None,
            resolution: Resolution::Unattributed,
            precedes_departure: false,
            departure_carried_forward: false,
        }
    }

    pub const fn attributed(
        crossing: &'a CrossingEvent,
        trip_id: TripId,
        departure: NaiveDateTime,
        resolution: Resolution,
    ) -> Self {
        Self {
            crossing,
            trip_id: Some(trip_id),
            departure: Some(departure),
            resolution,
            precedes_departure: false,
            departure_carried_forward: false,
        }
    }

    pub const fn is_attributed(&self) -> bool {
        self.trip_id.is_some()
    }

    pub const fn timestamp(&self) -> NaiveDateTime {
        self.crossing.timestamp()
    }
}
