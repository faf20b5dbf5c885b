//! Place records and wire types for the places endpoint.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// Status returned by the endpoint when results were found.
pub const STATUS_OK: &str = "OK";

/// Status returned by the endpoint for a valid query with no matches.
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Errors from a single places query.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacesError {
    /// Transport failure (connection refused, DNS, non-2xx, timeout).
    HttpError(String),
    /// The response body could not be decoded.
    InvalidResponse(String),
    /// The request URL could not be built.
    InvalidRequest(String),
}

impl fmt::Display for PlacesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacesError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            PlacesError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            PlacesError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for PlacesError {}

impl From<serde_json::Error> for PlacesError {
    fn from(e: serde_json::Error) -> Self {
        PlacesError::InvalidResponse(e.to_string())
    }
}

/// API credential for the places endpoint.
///
/// Only constructed through [`ApiKey::new`], which rejects blank values, so
/// holding an `ApiKey` means the credential has been validated.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validates a raw credential. Surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The credential value, for building requests.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// One nearby-search request for a single category.
#[derive(Debug, Clone)]
pub struct PlaceQuery {
    /// Search center
    pub location: Coordinate,
    /// Search radius in meters
    pub radius_meters: u32,
    /// Place type, e.g. `pharmacy` or `veterinary_care`
    pub category: String,
    /// Validated credential
    pub api_key: ApiKey,
}

/// Decoded nearby-search response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    /// `OK`, `ZERO_RESULTS`, `REQUEST_DENIED`, `OVER_QUERY_LIMIT`, ...
    pub status: String,
    #[serde(default)]
    pub results: Vec<RawPlace>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl SearchResponse {
    /// Successful response with the given records.
    pub fn ok(results: Vec<RawPlace>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            results,
            error_message: None,
        }
    }

    /// Failed response with a status and optional message.
    pub fn failed(status: impl Into<String>, error_message: Option<String>) -> Self {
        Self {
            status: status.into(),
            results: Vec::new(),
            error_message,
        }
    }

    /// True for `OK` and `ZERO_RESULTS`.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK || self.status == STATUS_ZERO_RESULTS
    }
}

/// Place record as returned by the endpoint. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPlace {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub geometry: Option<RawGeometry>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub vicinity: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RawGeometry {
    pub location: RawLatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RawLatLng {
    pub lat: f64,
    pub lng: f64,
}

impl RawPlace {
    /// Convenience constructor for a complete record.
    pub fn new(id: &str, name: &str, lat: f64, lng: f64) -> Self {
        Self {
            place_id: Some(id.to_string()),
            name: Some(name.to_string()),
            geometry: Some(RawGeometry {
                location: RawLatLng { lat, lng },
            }),
            types: Vec::new(),
            vicinity: None,
        }
    }

    /// Converts the record into a [`Place`].
    ///
    /// Returns `None` when the id, name or a valid position is missing.
    pub fn into_place(self) -> Option<Place> {
        let id = self.place_id.filter(|id| !id.is_empty())?;
        let name = self.name?;
        let location = self.geometry?.location;
        let coordinate = Coordinate::new(location.lat, location.lng).ok()?;

        Some(Place {
            id,
            name,
            coordinate,
            category_tags: self.types.into_iter().collect(),
            vicinity_label: self.vicinity.unwrap_or_default(),
        })
    }
}

/// A point of interest ready for marker rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    /// Provider-unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Marker position
    pub coordinate: Coordinate,
    /// Provider classification tags
    pub category_tags: BTreeSet<String>,
    /// Short address / neighbourhood line
    pub vicinity_label: String,
}
