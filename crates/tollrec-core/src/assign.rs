//! Provisional trip assignment by date kind and window containment.

use chrono::NaiveDate;

use crate::attribution::Attributed;
use crate::crossing::CrossingEvent;
use crate::partition::Partition;
use crate::trip::TripRecord;
use crate::types::Resolution;
use crate::window::{build_windows, find_window};

/// Assigns every crossing of a partitioned vehicle to a provisional trip,
/// then invalidates assignments whose crossing precedes the trip departure.
///
/// Output order is single-trip crossings, then multi-trip, then unscheduled.
pub fn assign<'a>(partition: &Partition<'a>) -> Vec<Attributed<'a>> {
    let mut assigned = Vec::with_capacity(partition.crossing_count());

    for &crossing in &partition.single_trip {
        assigned.push(assign_single_trip(crossing, partition.trips_on(crossing.date)));
    }

    for date in partition.multi_trip_dates() {
        let windows = build_windows(partition.trips_on(date));
        let on_date: Vec<_> = partition
            .multi_trip
            .iter()
            .filter(|c| c.date == date)
            .collect();

        let mut resolved = 0;
        for &&crossing in &on_date {
            let result = match find_window(&windows, crossing.time) {
                Some(window) => {
                    resolved += 1;
                    Attributed::attributed(
                        crossing,
                        window.trip_id.clone(),
                        window.departure,
                        Resolution::Window,
                    )
                }
                None => Attributed::unattributed(crossing),
            };
            assigned.push(result);
        }
        log_completeness(date, windows.len(), resolved, on_date.len());
    }

    if !partition.unscheduled.is_empty() {
        tracing::info!(
            dates = partition.unscheduled_dates().len(),
            crossings = partition.unscheduled.len(),
            "crossings on dates without trips"
        );
    }
    assigned.extend(
        partition
            .unscheduled
            .iter()
            .map(|&c| Attributed::unattributed(c)),
    );

    assigned.into_iter().map(check_ordering).collect()
}

/// The day's only trip takes every crossing; its latest leg that day is the departure.
fn assign_single_trip<'a>(crossing: &'a CrossingEvent, trips: &[&TripRecord]) -> Attributed<'a> {
    trips
        .iter()
        .max_by_key(|t| t.departure)
        .map_or_else(
            || Attributed::unattributed(crossing),
            |trip| {
                Attributed::attributed(
                    crossing,
                    trip.trip_id.clone(),
                    trip.departure,
                    Resolution::SingleTrip,
                )
            },
        )
}

/// Clears an attribution whose crossing happened before the trip departed.
fn check_ordering(record: Attributed<'_>) -> Attributed<'_> {
    match record.departure {
        Some(departure) if record.timestamp() < departure => {
            tracing::debug!(
                crossing = %record.timestamp(),
                %departure,
                trip_id = ?record.trip_id,
                "crossing precedes trip departure, assignment invalidated"
            );
            Attributed {
                precedes_departure: true,
                ..Attributed::unattributed(record.crossing)
            }
        }
        _ => record,
    }
}

fn log_completeness(date: NaiveDate, trips: usize, resolved: usize, total: usize) {
    if resolved == total {
        tracing::debug!(%date, trips, crossings = total, "all crossings matched a window");
    } else {
        tracing::info!(
            %date,
            trips,
            resolved,
            total,
            "crossings outside every trip window"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition;
    use crate::testing::{at, crossing, trip, trip_id};

    fn run<'a>(trips: &'a [TripRecord], crossings: &'a [CrossingEvent]) -> Vec<Attributed<'a>> {
        let trip_refs: Vec<_> = trips.iter().collect();
        let crossing_refs: Vec<_> = crossings.iter().collect();
        let mut result = assign(&partition(&trip_refs, &crossing_refs));
        result.sort_by_key(Attributed::timestamp);
        result
    }

    #[test]
    fn test_single_trip_date_assigns_directly() {
        let trips = vec![trip("T9", "2402", "2025-01-10 06:00:00")];
        let crossings = vec![
            crossing("2402", "2025-01-10 06:30:00", "SALINAS"),
            crossing("2402", "2025-01-10 21:00:00", "SALINAS"),
        ];

        let result = run(&trips, &crossings);

        for record in &result {
            assert_eq!(record.trip_id, Some(trip_id("T9")));
            assert_eq!(record.departure, Some(at("2025-01-10 06:00:00")));
            assert_eq!(record.resolution, Resolution::SingleTrip);
        }
    }

    #[test]
    fn test_single_trip_before_departure_is_invalidated() {
        let trips = vec![trip("T9", "2402", "2025-01-10 06:00:00")];
        let crossings = vec![crossing("2402", "2025-01-10 05:00:00", "SALINAS")];

        let result = run(&trips, &crossings);

        assert_eq!(result[0].trip_id, None);
        assert_eq!(result[0].departure, None);
        assert!(result[0].precedes_departure);
        assert_eq!(result[0].resolution, Resolution::Unattributed);
    }

    #[test]
    fn test_single_trip_with_two_legs_uses_latest_leg() {
        let trips = vec![
            trip("T9", "2402", "2025-01-10 06:00:00"),
            trip("T9", "2402", "2025-01-10 07:00:00"),
        ];
        let crossings = vec![crossing("2402", "2025-01-10 09:00:00", "SALINAS")];

        let result = run(&trips, &crossings);

        assert_eq!(result[0].departure, Some(at("2025-01-10 07:00:00")));
    }

    #[test]
    fn test_multi_trip_date_uses_windows() {
        let trips = vec![
            trip("T1", "3502", "2025-01-10 08:00:00"),
            trip("T2", "3502", "2025-01-10 13:00:00"),
        ];
        let crossings = vec![
            crossing("3502", "2025-01-10 07:50:00", "SALINAS"),
            crossing("3502", "2025-01-10 09:00:00", "SALINAS"),
            crossing("3502", "2025-01-10 13:05:00", "SALINAS"),
        ];

        let result = run(&trips, &crossings);

        let ids: Vec<_> = result.iter().map(|r| r.trip_id.clone()).collect();
        assert_eq!(ids, vec![None, Some(trip_id("T1")), Some(trip_id("T2"))]);
        assert_eq!(result[1].resolution, Resolution::Window);
        assert!(!result[0].precedes_departure);
    }

    #[test]
    fn test_unscheduled_date_left_unassigned() {
        let trips = vec![trip("T1", "2402", "2025-01-10 08:00:00")];
        let crossings = vec![crossing("2402", "2025-01-12 10:00:00", "SALINAS")];

        let result = run(&trips, &crossings);

        assert_eq!(result.len(), 1);
        assert!(!result[0].is_attributed());
        assert_eq!(result[0].resolution, Resolution::Unattributed);
    }
}
