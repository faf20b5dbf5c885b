//! Discovery configuration.
//!
//! Settings come from an INI file (by default
//! `~/.config/petnearby/config.ini`) with built-in defaults for anything not
//! set. The places API key may also be supplied through the
//! `PETNEARBY_PLACES_API_KEY` environment variable, which wins over the file.
//!
//! # File Format
//!
//! ```ini
//! [places]
//! api_key = YOUR_API_KEY
//! radius_meters = 5000
//! categories = pharmacy, veterinary_care
//!
//! [location]
//! high_accuracy = true
//! timeout_ms = 5000
//! max_cached_age_ms = 10000
//! ; first_fix_timeout_secs = 60
//!
//! [map]
//! camera_animation_ms = 1000
//! ```

mod file;

pub use file::{default_config_path, ConfigError, API_KEY_ENV_VAR};

use std::time::Duration;

use crate::location::{LocationOptions, DEFAULT_LOCATION_TIMEOUT, DEFAULT_MAX_CACHED_AGE};
use crate::places::{DEFAULT_NEARBY_SEARCH_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Default search radius around the first fix.
pub const DEFAULT_RADIUS_METERS: u32 = 5000;

/// Categories searched when none are configured.
pub const DEFAULT_CATEGORIES: &[&str] = &["pharmacy", "veterinary_care"];

/// Camera transition length when centering on the first fix.
pub const DEFAULT_CAMERA_ANIMATION: Duration = Duration::from_millis(1000);

/// Top-level configuration for a discovery screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscoveryConfig {
    /// Places endpoint settings.
    pub places: PlacesConfig,
    /// Location provider settings.
    pub location: LocationConfig,
    /// Map camera settings.
    pub map: MapConfig,
}

/// Places endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacesConfig {
    /// API credential. Validated when the aggregator is built.
    pub api_key: Option<String>,
    /// Nearby-search endpoint URL.
    pub endpoint: String,
    /// Search radius in meters.
    pub radius_meters: u32,
    /// Categories in merge order.
    pub categories: Vec<String>,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_NEARBY_SEARCH_ENDPOINT.to_string(),
            radius_meters: DEFAULT_RADIUS_METERS,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Location provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationConfig {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub max_cached_age: Duration,
    /// Give up waiting for the first fix after this long. `None` waits forever.
    pub first_fix_timeout: Option<Duration>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_LOCATION_TIMEOUT,
            max_cached_age: DEFAULT_MAX_CACHED_AGE,
            first_fix_timeout: None,
        }
    }
}

impl LocationConfig {
    /// Options handed to the location provider on subscribe.
    pub fn options(&self) -> LocationOptions {
        LocationOptions {
            high_accuracy: self.high_accuracy,
            timeout: self.timeout,
            max_cached_age: self.max_cached_age,
        }
    }
}

/// Map camera settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub camera_animation: Duration,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            camera_animation: DEFAULT_CAMERA_ANIMATION,
        }
    }
}

impl DiscoveryConfig {
    /// Set the places API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.places.api_key = Some(api_key.into());
        self
    }

    /// Replace the searched categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.places.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set the search radius.
    pub fn with_radius_meters(mut self, radius_meters: u32) -> Self {
        self.places.radius_meters = radius_meters;
        self
    }

    /// Set or clear the first-fix timeout.
    pub fn with_first_fix_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.location.first_fix_timeout = timeout;
        self
    }

    /// Set the places endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.places.endpoint = endpoint.into();
        self
    }

    /// Apply an environment-supplied API key, if non-empty.
    pub fn with_env_api_key(mut self, value: Option<String>) -> Self {
        if let Some(key) = value.filter(|v| !v.trim().is_empty()) {
            self.places.api_key = Some(key);
        }
        self
    }
}
