//! Coordinate types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Latitude span of a [`Region`] derived from a single coordinate.
pub const REGION_LATITUDE_DELTA: f64 = 0.0922;
/// Longitude span of a [`Region`] derived from a single coordinate.
pub const REGION_LONGITUDE_DELTA: f64 = 0.0421;

/// Errors that can occur when constructing coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside [-90, 90] or not finite.
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),
    /// Longitude is outside [-180, 180] or not finite.
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
}

/// A WGS84 geographic position reported by the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (positive = north)
    pub latitude: f64,
    /// Longitude in degrees (positive = east)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Formats the coordinate as `lat,lng`, the form the places endpoint expects.
    pub fn to_query_param(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Map camera extent centered on a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Center of the visible area
    pub center: Coordinate,
    /// Visible latitude span in degrees
    pub latitude_delta: f64,
    /// Visible longitude span in degrees
    pub longitude_delta: f64,
}

impl Region {
    /// Derives the standard "nearby" region for a coordinate.
    ///
    /// The deltas are fixed, so the same coordinate always yields the same
    /// region.
    pub fn around(center: Coordinate) -> Self {
        Self {
            center,
            latitude_delta: REGION_LATITUDE_DELTA,
            longitude_delta: REGION_LONGITUDE_DELTA,
        }
    }

    /// Returns true if the coordinate falls inside the visible extent.
    pub fn contains(&self, coord: &Coordinate) -> bool {
        let half_lat = self.latitude_delta / 2.0;
        let half_lon = self.longitude_delta / 2.0;
        (coord.latitude - self.center.latitude).abs() <= half_lat
            && (coord.longitude - self.center.longitude).abs() <= half_lon
    }
}

impl From<Coordinate> for Region {
    fn from(center: Coordinate) -> Self {
        Region::around(center)
    }
}
