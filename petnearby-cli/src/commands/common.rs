//! Common types and utilities shared across CLI commands.

use std::path::Path;
use std::time::Duration;

use console::style;

use petnearby::config::DiscoveryConfig;
use petnearby::coord::Coordinate;
use petnearby::places::{AsyncReqwestClient, GooglePlacesClient, Place};

use crate::error::CliError;

/// Places overrides accepted by every command that searches.
#[derive(Debug, Clone, Default)]
pub struct PlacesOverrides {
    pub api_key: Option<String>,
    pub radius: Option<u32>,
    pub categories: Vec<String>,
}

/// Load configuration from `path` (or the default location).
pub fn load_config(path: Option<&Path>) -> Result<DiscoveryConfig, CliError> {
    Ok(DiscoveryConfig::load(path)?)
}

/// Apply CLI overrides on top of the loaded config.
///
/// CLI takes precedence, then environment, then config file.
pub fn resolve_places(mut config: DiscoveryConfig, overrides: PlacesOverrides) -> DiscoveryConfig {
    if let Some(key) = overrides.api_key {
        config = config.with_api_key(key);
    }
    if let Some(radius) = overrides.radius {
        config = config.with_radius_meters(radius);
    }
    if !overrides.categories.is_empty() {
        config = config.with_categories(overrides.categories);
    }
    config
}

/// Resolve the first-fix timeout; `Some(0)` on the command line disables it.
pub fn resolve_first_fix_timeout(cli_secs: Option<u64>, config: &DiscoveryConfig) -> Option<Duration> {
    match cli_secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.location.first_fix_timeout,
    }
}

/// Build the Google Places client for the configured endpoint.
pub fn places_client(config: &DiscoveryConfig) -> Result<GooglePlacesClient<AsyncReqwestClient>, CliError> {
    let http = AsyncReqwestClient::with_timeout(config.places.request_timeout_secs)?;
    Ok(GooglePlacesClient::with_endpoint(http, config.places.endpoint.clone()))
}

/// Parse a `--lat`/`--lon` pair.
pub fn parse_coordinate(lat: f64, lon: f64) -> Result<Coordinate, CliError> {
    Ok(Coordinate::new(lat, lon)?)
}

/// Human-readable distance.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Print places in the order given, with distance from `origin`.
pub fn print_places(origin: Coordinate, places: &[Place]) {
    for place in places {
        let tags: Vec<_> = place.category_tags.iter().map(String::as_str).collect();
        println!(
            "  {:>8}  {}  {}",
            format_distance(origin.distance_meters(&place.coordinate)),
            style(&place.name).green(),
            style(tags.join(", ")).dim()
        );
        if !place.vicinity_label.is_empty() {
            println!("            {}", place.vicinity_label);
        }
    }
}
