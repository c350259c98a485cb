//! Override booth look-ahead and departure carry-forward.
//!
//! The override booth registers a vehicle before it continues on its next
//! delivery leg, so its charges belong to the trip of the crossing that
//! follows it.

use chrono::NaiveDateTime;

use crate::attribution::Attributed;
use crate::types::{Resolution, TripId};

/// Orders a vehicle's records chronologically.
///
/// The sort is stable, so crossings sharing a timestamp keep the order the
/// earlier stages produced.
pub fn chronological(mut records: Vec<Attributed<'_>>) -> Vec<Attributed<'_>> {
    records.sort_by_key(Attributed::timestamp);
    records
}

/// Replaces the attribution of every crossing at `booth` with the attribution
/// of the next crossing in time.
///
/// `records` must be chronological and belong to a single vehicle. The next
/// crossing's attribution is read as it was before this pass, so a run of
/// override crossings does not cascade. The last crossing has no successor
/// and ends up unattributed if it is at the booth.
pub fn apply_override<'a>(records: Vec<Attributed<'a>>, booth: &str) -> Vec<Attributed<'a>> {
    let successors: Vec<(Option<TripId>, Option<NaiveDateTime>)> = records
        .iter()
        .skip(1)
        .map(|next| (next.trip_id.clone(), next.departure))
        .chain(std::iter::once((None, None)))
        .collect();

    let mut overridden = 0usize;
    let result = records
        .into_iter()
        .zip(successors)
        .map(|(current, (trip_id, departure))| {
            if !current.crossing.is_at_booth(booth) {
                return current;
            }
            overridden += 1;
            let resolution = if trip_id.is_some() {
                Resolution::BoothOverride
            } else {
                Resolution::Unattributed
            };
            Attributed {
                trip_id,
                departure,
                resolution,
                ..current
            }
        })
        .collect();

    if overridden > 0 {
        tracing::debug!(booth, overridden, "applied override booth look-ahead");
    }
    result
}

/// Fills missing departures from the nearest earlier record that has one.
///
/// `records` must be chronological. Records with no earlier value stay empty.
pub fn carry_forward_departures(records: Vec<Attributed<'_>>) -> Vec<Attributed<'_>> {
    let mut last_known: Option<NaiveDateTime> = None;
    records
        .into_iter()
        .map(|record| match (record.departure, last_known) {
            (Some(departure), _) => {
                last_known = Some(departure);
                record
            }
            (None, Some(previous)) => Attributed {
                departure: Some(previous),
                departure_carried_forward: true,
                ..record
            },
            (None, None) => record,
        })
        .collect()
}
