//! CLI error type.

use std::fmt;

use petnearby::config::ConfigError;
use petnearby::coord::CoordError;
use petnearby::logging::LoggingError;
use petnearby::places::{AggregationError, PlacesError};

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is incomplete
    Config(String),
    /// Logging could not be set up
    Logging(LoggingError),
    /// Invalid coordinate on the command line
    Coordinate(CoordError),
    /// Places search failed
    Places(String),
    /// Discovery session ended in `Failed`
    Discovery(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Coordinate(e) => write!(f, "{}", e),
            CliError::Places(msg) => write!(f, "Places search failed: {}", msg),
            CliError::Discovery(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coordinate(e)
    }
}

impl From<PlacesError> for CliError {
    fn from(e: PlacesError) -> Self {
        CliError::Places(e.to_string())
    }
}

impl From<AggregationError> for CliError {
    fn from(e: AggregationError) -> Self {
        match e {
            AggregationError::Configuration(msg) => CliError::Config(msg),
            other => CliError::Places(other.to_string()),
        }
    }
}
