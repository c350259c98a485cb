//! Vehicle-wide trip timeline used to resolve crossings the per-date
//! assignment left open.

use chrono::NaiveDateTime;

use crate::attribution::Attributed;
use crate::trip::TripRecord;
use crate::types::{Resolution, TripId};

/// One trip's span on the vehicle timeline: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripInterval {
    pub trip_id: TripId,
    /// Earliest departure of the trip across its legs.
    pub start: NaiveDateTime,
    /// Start of the next trip; `None` for the vehicle's last trip.
    pub end: Option<NaiveDateTime>,
}

impl TripInterval {
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && self.end.is_none_or(|end| timestamp < end)
    }
}

/// Ordered, non-overlapping trip intervals for one vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    intervals: Vec<TripInterval>,
}

impl Timeline {
    /// Builds the timeline from all of a vehicle's trip legs, across dates.
    pub fn from_trips(trips: &[&TripRecord]) -> Self {
        let mut starts: Vec<(&TripId, NaiveDateTime)> = Vec::new();
        for trip in trips {
            match starts.iter_mut().find(|(id, _)| **id == trip.trip_id) {
                Some((_, start)) => *start = (*start).min(trip.departure),
                None => starts.push((&trip.trip_id, trip.departure)),
            }
        }
        starts.sort_by_key(|&(_, start)| start);

        let intervals = starts
            .iter()
            .enumerate()
            .map(|(idx, &(trip_id, start))| {
                let tied_with_previous = idx > 0 && starts[idx - 1].1 == start;
                let end = if tied_with_previous {
                    Some(start)
                } else {
                    starts[idx + 1..]
                        .iter()
                        .map(|&(_, next)| next)
                        .find(|&next| next > start)
                };
                TripInterval {
                    trip_id: trip_id.clone(),
                    start,
                    end,
                }
            })
            .collect();
        Self { intervals }
    }

    pub fn intervals(&self) -> &[TripInterval] {
        &self.intervals
    }

    /// Finds the interval containing `timestamp`.
    pub fn find(&self, timestamp: NaiveDateTime) -> Option<&TripInterval> {
        let upto = self.intervals.partition_point(|i| i.start <= timestamp);
        let last_start = self.intervals[..upto].last()?.start;
        // Tied starts: the first of the run owns the interval.
        let first = self.intervals[..upto].partition_point(|i| i.start < last_start);
        self.intervals.get(first).filter(|i| i.contains(timestamp))
    }
}

/// Resolves every unattributed record against the vehicle timeline.
///
/// Records already attributed pass through unchanged. Records before the
/// first trip of the vehicle stay unattributed.
pub fn resolve<'a>(records: Vec<Attributed<'a>>, timeline: &Timeline) -> Vec<Attributed<'a>> {
    let mut unmatched = 0usize;
    let resolved = records
        .into_iter()
        .map(|record| {
            if record.is_attributed() {
                return record;
            }
            match timeline.find(record.timestamp()) {
                Some(interval) => Attributed {
                    precedes_departure: record.precedes_departure,
                    ..Attributed::attributed(
                        record.crossing,
                        interval.trip_id.clone(),
                        interval.start,
                        Resolution::Fallback,
                    )
                },
                None => {
                    unmatched += 1;
                    record
                }
            }
        })
        .collect();

    if unmatched > 0 {
        tracing::info!(unmatched, "crossings precede every trip of the vehicle");
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, crossing, trip, trip_id};

    fn timeline(trips: &[TripRecord]) -> Timeline {
        let refs: Vec<_> = trips.iter().collect();
        Timeline::from_trips(&refs)
    }

    #[test]
    fn test_timeline_spans_dates() {
        let trips = vec![
            trip("T2", "2402", "2025-01-11 07:00:00"),
            trip("T1", "2402", "2025-01-10 08:00:00"),
            trip("T1", "2402", "2025-01-10 06:00:00"),
        ];

        let tl = timeline(&trips);

        assert_eq!(
            tl.intervals(),
            &[
                TripInterval {
                    trip_id: trip_id("T1"),
                    start: at("2025-01-10 06:00:00"),
                    end: Some(at("2025-01-11 07:00:00")),
                },
                TripInterval {
                    trip_id: trip_id("T2"),
                    start: at("2025-01-11 07:00:00"),
                    end: None,
                },
            ]
        );
    }

    #[test]
    fn test_find_half_open() {
        let trips = vec![
            trip("T1", "2402", "2025-01-10 08:00:00"),
            trip("T2", "2402", "2025-01-11 07:00:00"),
        ];
        let tl = timeline(&trips);

        let owner = |ts: &str| tl.find(at(ts)).map(|i| i.trip_id.as_str());
        assert_eq!(owner("2025-01-10 07:59:59"), None);
        assert_eq!(owner("2025-01-10 08:00:00"), Some("T1"));
        assert_eq!(owner("2025-01-11 06:59:59"), Some("T1"));
        assert_eq!(owner("2025-01-11 07:00:00"), Some("T2"));
        assert_eq!(owner("2025-03-01 00:00:00"), Some("T2"));
    }

    #[test]
    fn test_find_with_tied_starts_prefers_first_recorded() {
        let trips = vec![
            trip("T4", "2402", "2025-01-10 08:00:00"),
            trip("T3", "2402", "2025-01-10 08:00:00"),
            trip("T5", "2402", "2025-01-10 12:00:00"),
        ];
        let tl = timeline(&trips);

        assert_eq!(tl.find(at("2025-01-10 08:00:00")).unwrap().trip_id, trip_id("T4"));
        assert_eq!(tl.find(at("2025-01-10 11:00:00")).unwrap().trip_id, trip_id("T4"));
        assert_eq!(tl.find(at("2025-01-10 12:30:00")).unwrap().trip_id, trip_id("T5"));
    }

    #[test]
    fn test_empty_timeline_finds_nothing() {
        let tl = timeline(&[]);
        assert!(tl.find(at("2025-01-10 08:00:00")).is_none());
    }

    #[test]
    fn test_resolve_fills_only_unattributed() {
        let trips = vec![
            trip("T1", "2402", "2025-01-09 20:00:00"),
            trip("T2", "2402", "2025-01-10 06:00:00"),
        ];
        let tl = timeline(&trips);
        let early = crossing("2402", "2025-01-10 05:00:00", "SALINAS");
        let before_all = crossing("2402", "2025-01-09 10:00:00", "SALINAS");
        let kept = crossing("2402", "2025-01-10 09:00:00", "SALINAS");

        let records = vec![
            Attributed {
                precedes_departure: true,
                ..Attributed::unattributed(&early)
            },
            Attributed::unattributed(&before_all),
            Attributed::attributed(
                &kept,
                trip_id("T2"),
                at("2025-01-10 06:00:00"),
                Resolution::SingleTrip,
            ),
        ];

        let result = resolve(records, &tl);

        assert_eq!(result[0].trip_id, Some(trip_id("T1")));
        assert_eq!(result[0].departure, Some(at("2025-01-09 20:00:00")));
        assert_eq!(result[0].resolution, Resolution::Fallback);
        assert!(result[0].precedes_departure);
        assert!(!result[1].is_attributed());
        assert_eq!(result[2].resolution, Resolution::SingleTrip);
    }
}
