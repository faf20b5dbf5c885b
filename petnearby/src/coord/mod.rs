//! Coordinate module
//!
//! Provides the geographic position type reported by the location provider,
//! the map camera [`Region`] derived from it, and great-circle distance used
//! to annotate places relative to the user.

mod types;

pub use types::{
    CoordError, Coordinate, Region, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON, REGION_LATITUDE_DELTA,
    REGION_LONGITUDE_DELTA,
};

/// Mean earth radius in meters (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Great-circle distance between two coordinates using the haversine formula.
///
/// # Returns
///
/// Distance in meters.
#[inline]
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

impl Coordinate {
    /// Distance in meters to another coordinate.
    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        haversine_distance(self, other)
    }
}
