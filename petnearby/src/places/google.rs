//! Google Places nearby-search client.
//!
//! Uses the Places API "Nearby Search" endpoint with API-key authentication.
//! Users must have a Google Cloud project with the Places API enabled.
//!
//! # API Endpoint
//!
//! `https://maps.googleapis.com/maps/api/place/nearbysearch/json?location={lat},{lng}&radius={m}&type={category}&key={API_KEY}`
//!
//! The endpoint answers HTTP 200 even for rejected requests; the outcome is
//! carried in the JSON `status` field and interpreted by the aggregator.

use reqwest::Url;
use tracing::trace;

use crate::places::{AsyncHttpClient, PlaceQuery, PlacesClient, PlacesError, SearchResponse};
use crate::BoxFuture;

/// Default nearby-search endpoint.
pub const DEFAULT_NEARBY_SEARCH_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Google Places nearby-search client.
///
/// # Example
///
/// ```no_run
/// use petnearby::places::{AsyncReqwestClient, GooglePlacesClient};
///
/// let http = AsyncReqwestClient::new().unwrap();
/// let client = GooglePlacesClient::new(http);
/// // Hand the client to a PlaceAggregator...
/// ```
pub struct GooglePlacesClient<C: AsyncHttpClient> {
    http_client: C,
    endpoint: String,
}

impl<C: AsyncHttpClient> GooglePlacesClient<C> {
    /// Creates a client for the public endpoint.
    pub fn new(http_client: C) -> Self {
        Self::with_endpoint(http_client, DEFAULT_NEARBY_SEARCH_ENDPOINT)
    }

    /// Creates a client for a custom endpoint (proxies, test servers).
    pub fn with_endpoint(http_client: C, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }

    /// Builds the request URL for a query.
    fn build_url(&self, query: &PlaceQuery) -> Result<Url, PlacesError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("location", query.location.to_query_param()),
                ("radius", query.radius_meters.to_string()),
                ("type", query.category.clone()),
                ("key", query.api_key.expose().to_string()),
            ],
        )
        .map_err(|e| PlacesError::InvalidRequest(format!("{}: {}", self.endpoint, e)))
    }
}

impl<C: AsyncHttpClient> PlacesClient for GooglePlacesClient<C> {
    fn search<'a>(&'a self, query: &'a PlaceQuery) -> BoxFuture<'a, Result<SearchResponse, PlacesError>> {
        Box::pin(async move {
            let url = self.build_url(query)?;
            trace!(category = %query.category, "Dispatching nearby search");

            let body = self.http_client.get(url.as_str()).await?;
            let response: SearchResponse = serde_json::from_slice(&body)?;
            Ok(response)
        })
    }

    fn name(&self) -> &str {
        "Google Places"
    }
}
