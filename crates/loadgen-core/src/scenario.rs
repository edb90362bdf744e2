use std::time::Duration;

use serde_json::{json, Value};

/// Requests fired once before the load phase to light up the error panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScenario {
    /// A body made of one field the API does not know.
    UnknownField,
    /// A body holding a single valid field and nothing else.
    MissingFields,
    /// A path the API does not serve.
    MissingRoute,
}

impl ErrorScenario {
    pub const ALL: [ErrorScenario; 3] = [Self::UnknownField, Self::MissingFields, Self::MissingRoute];

    pub fn name(self) -> &'static str {
        match self {
            Self::UnknownField => "invalid data",
            Self::MissingFields => "incomplete data",
            Self::MissingRoute => "non-existent endpoint",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::UnknownField | Self::MissingFields => "/predict",
            Self::MissingRoute => "/nonexistent",
        }
    }

    /// JSON body to POST, or `None` for a plain GET.
    pub fn payload(self) -> Option<Value> {
        match self {
            Self::UnknownField => Some(json!({ "invalid_field": "invalid_value" })),
            Self::MissingFields => Some(json!({ "osrm_distance": 1000 })),
            Self::MissingRoute => None,
        }
    }

    pub fn timeout(self) -> Duration { Duration::from_secs(5) }
}
