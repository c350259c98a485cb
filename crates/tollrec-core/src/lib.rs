//! Core reconciliation logic for trip and toll-crossing logs.
//!
//! This crate contains the typed records and the pipeline that attributes
//! every toll crossing to a trip of the same vehicle:
//! - Partitioning: grouping crossings by vehicle and by the kind of their date
//! - Windows: containment matching on dates with several trips
//! - Fallback: a vehicle-wide timeline for crossings left open
//! - Booth override: look-ahead attribution for the override booth

mod assign;
mod attribution;
mod booth;
pub mod crossing;
pub mod engine;
mod fallback;
mod join;
pub mod partition;
#[cfg(test)]
mod testing;
pub mod trip;
pub mod types;
mod window;

pub use crossing::CrossingEvent;
pub use engine::{
    Correlation, CorrelationError, CorrelationResult, Diagnostics, EngineConfig,
    VehicleCorrelation, correlate, correlate_vehicle,
};
pub use fallback::{Timeline, TripInterval};
pub use trip::{TripLog, TripRecord};
pub use types::{Resolution, TripId, ValidationError, VehicleId};
pub use window::{TripWindow, build_windows};
