//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The fleet code prefix must be a single ASCII digit.
    #[error("fleet code prefix must be an ASCII digit, got {value:?}")]
    FleetPrefixNotDigit { value: char },

    /// Invalid resolution value.
    #[error("invalid resolution: {value}")]
    InvalidResolution { value: String },
}

/// Which pipeline stage produced a crossing's attribution.
///
/// Later stages win: a booth override replaces whatever the window or
/// fallback stage computed for that crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The crossing's date has exactly one trip.
    SingleTrip,
    /// The crossing fell inside a trip window of a multi-trip date.
    Window,
    /// Resolved against the vehicle-wide interval timeline.
    Fallback,
    /// Taken from the next crossing because of the override booth.
    BoothOverride,
    /// No trip could be attributed.
    Unattributed,
}

impl Resolution {
    /// All variants, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::SingleTrip,
        Self::Window,
        Self::Fallback,
        Self::BoothOverride,
        Self::Unattributed,
    ];

    /// String representation used in exports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleTrip => "single_trip",
            Self::Window => "window",
            Self::Fallback => "fallback",
            Self::BoothOverride => "booth_override",
            Self::Unattributed => "unattributed",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Resolution {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidResolution {
                value: s.to_string(),
            })
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated trip identifier (the trip log's document number).
    ///
    /// A trip id may repeat across unit legs with distinct departure
    /// timestamps, so it is not unique per record.
    TripId, "trip ID"
);

define_string_id!(
    /// A validated vehicle identifier (the fleet's economic number, e.g. `2402`).
    VehicleId, "vehicle ID"
);

impl VehicleId {
    /// Returns the display form of the vehicle id.
    ///
    /// Ids beginning with `fleet_prefix` are shown with the fleet name in
    /// front (`2402` becomes `VELOX 2402`); others are shown as-is.
    #[must_use]
    pub fn display_with_fleet(&self, fleet_prefix: char, fleet_name: &str) -> String {
        if self.0.starts_with(fleet_prefix) {
            format!("{fleet_name} {}", self.0)
        } else {
            self.0.clone()
        }
    }
}
