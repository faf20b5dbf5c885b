//! INI file loading for [`DiscoveryConfig`].

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::{debug, info};

use super::DiscoveryConfig;

/// Environment variable that overrides `[places] api_key`.
pub const API_KEY_ENV_VAR: &str = "PETNEARBY_PLACES_API_KEY";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// A value could not be parsed.
    #[error("Invalid value for [{section}] {key}: {value:?}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// Default location of the config file (`<config dir>/petnearby/config.ini`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("petnearby").join("config.ini"))
}

impl DiscoveryConfig {
    /// Loads configuration from `path`, or the default path if `None`.
    ///
    /// A missing file yields defaults. The API key environment variable is
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);

        let config = match path {
            Some(path) if path.exists() => {
                let ini = Ini::load_from_file(&path).map_err(|e| ConfigError::Read {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                info!(path = %path.display(), "Loaded configuration");
                Self::from_ini(&ini)?
            }
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        Ok(config.with_env_api_key(std::env::var(API_KEY_ENV_VAR).ok()))
    }

    /// Parses configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(places) = ini.section(Some("places")) {
            if let Some(key) = places.get("api_key").filter(|k| !k.trim().is_empty()) {
                config.places.api_key = Some(key.trim().to_string());
            }
            if let Some(endpoint) = places.get("endpoint") {
                config.places.endpoint = endpoint.trim().to_string();
            }
            if let Some(radius) = parse(places, "places", "radius_meters")? {
                config.places.radius_meters = radius;
            }
            if let Some(categories) = places.get("categories") {
                config.places.categories = categories
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            if let Some(secs) = parse(places, "places", "request_timeout_secs")? {
                config.places.request_timeout_secs = secs;
            }
        }

        if let Some(location) = ini.section(Some("location")) {
            if let Some(high_accuracy) = parse(location, "location", "high_accuracy")? {
                config.location.high_accuracy = high_accuracy;
            }
            if let Some(ms) = parse(location, "location", "timeout_ms")? {
                config.location.timeout = Duration::from_millis(ms);
            }
            if let Some(ms) = parse(location, "location", "max_cached_age_ms")? {
                config.location.max_cached_age = Duration::from_millis(ms);
            }
            if let Some(secs) = parse::<u64>(location, "location", "first_fix_timeout_secs")? {
                config.location.first_fix_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
        }

        if let Some(map) = ini.section(Some("map")) {
            if let Some(ms) = parse(map, "map", "camera_animation_ms")? {
                config.map.camera_animation = Duration::from_millis(ms);
            }
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(props: &Properties, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
    match props.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                value: raw.to_string(),
            }),
    }
}
