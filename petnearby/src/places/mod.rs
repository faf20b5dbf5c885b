//! Nearby places lookup
//!
//! This module provides the places query endpoint abstraction, the Google
//! Places implementation, and the [`PlaceAggregator`] that fans one query
//! out per category and merges the answers.
//!
//! # Fan-out / fan-in
//!
//! ```text
//!                  ┌── search(pharmacy) ─────────┐
//! fetch_nearby ────┤                             ├──► merge in category order
//!                  └── search(veterinary_care) ──┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use petnearby::places::{AsyncReqwestClient, GooglePlacesClient, PlaceAggregator};
//!
//! let client = GooglePlacesClient::new(AsyncReqwestClient::new()?);
//! let aggregator = PlaceAggregator::new(client, Some("YOUR_API_KEY"))?;
//! let aggregation = aggregator
//!     .fetch_nearby(coordinate, &["pharmacy".into(), "veterinary_care".into()], 5000)
//!     .await?;
//! ```

mod aggregator;
mod google;
mod http;
mod types;

pub use aggregator::{
    validate_categories, Aggregation, AggregationError, CategoryFailure, FailureReason,
    PlaceAggregator,
};
pub use google::{GooglePlacesClient, DEFAULT_NEARBY_SEARCH_ENDPOINT};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use types::{
    ApiKey, Place, PlaceQuery, PlacesError, RawGeometry, RawLatLng, RawPlace, SearchResponse,
    STATUS_OK, STATUS_ZERO_RESULTS,
};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;

use crate::BoxFuture;

/// Places query endpoint.
///
/// One call answers one category around one coordinate. A non-success
/// `status` in the response is not an `Err`; only transport and decoding
/// problems are.
pub trait PlacesClient: Send + Sync {
    /// Runs a nearby search.
    fn search<'a>(&'a self, query: &'a PlaceQuery) -> BoxFuture<'a, Result<SearchResponse, PlacesError>>;

    /// Human-readable endpoint name for logs.
    fn name(&self) -> &str;
}

impl<T: PlacesClient + ?Sized> PlacesClient for std::sync::Arc<T> {
    fn search<'a>(&'a self, query: &'a PlaceQuery) -> BoxFuture<'a, Result<SearchResponse, PlacesError>> {
        (**self).search(query)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
