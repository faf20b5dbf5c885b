//! Discovery error types.

use std::time::Duration;

use thiserror::Error;

use crate::location::LocationError;
use crate::permission::DenialReason;
use crate::places::AggregationError;

/// Errors that end a discovery session in the `Failed` state.
///
/// Every variant renders to the text shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscoveryError {
    /// Missing or invalid configuration (e.g. no API key).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Location permission was not granted.
    #[error("{0}")]
    Permission(DenialReason),

    /// The location stream could not be started.
    #[error("Location unavailable: {0}")]
    LocationStream(#[from] LocationError),

    /// No location fix arrived within the configured timeout.
    #[error("Could not determine your location within {} seconds", .0.as_secs())]
    LocationUnavailable(Duration),

    /// Every place category failed.
    #[error("{0}")]
    Aggregation(AggregationError),
}

impl From<AggregationError> for DiscoveryError {
    fn from(e: AggregationError) -> Self {
        match e {
            AggregationError::Configuration(msg) => DiscoveryError::Configuration(msg),
            other => DiscoveryError::Aggregation(other),
        }
    }
}

impl From<DenialReason> for DiscoveryError {
    fn from(reason: DenialReason) -> Self {
        DiscoveryError::Permission(reason)
    }
}
