//! Multi-category place aggregation.
//!
//! Issues one nearby search per category and merges the answers into a
//! single ordered list. Categories fail independently: one rejected or
//! unreachable category never aborts the others.

use std::collections::HashSet;
use std::fmt;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{ApiKey, Place, PlaceQuery, PlacesError, SearchResponse};
use super::PlacesClient;
use crate::coord::Coordinate;

/// Why one category produced no results.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The endpoint answered with a non-success status.
    Status {
        status: String,
        message: Option<String>,
    },
    /// The query never produced a decodable answer.
    Transport(PlacesError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Status {
                status,
                message: Some(message),
            } => write!(f, "{} ({})", status, message),
            FailureReason::Status {
                status,
                message: None,
            } => f.write_str(status),
            FailureReason::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// A category whose query failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFailure {
    pub category: String,
    pub reason: FailureReason,
}

impl fmt::Display for CategoryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.reason)
    }
}

fn join_failures(failures: &[CategoryFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that end an aggregation without results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// Missing credential or empty category list. No query was sent.
    #[error("Places search is not configured: {0}")]
    Configuration(String),

    /// Every category failed.
    #[error("Could not load nearby places: {}", join_failures(.failures))]
    TotalFailure { failures: Vec<CategoryFailure> },
}

/// Merged outcome of a successful aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Places in category order, then provider order.
    pub places: Vec<Place>,
    /// Categories that failed while others succeeded.
    pub failures: Vec<CategoryFailure>,
}

impl Aggregation {
    /// True if some categories failed.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Informational text describing failed categories.
    pub fn warning(&self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(format!(
                "Some results are unavailable: {}",
                join_failures(&self.failures)
            ))
        }
    }
}

/// Checks that there is at least one category to search.
///
/// # Errors
///
/// Returns [`AggregationError::Configuration`] for an empty list.
pub fn validate_categories(categories: &[String]) -> Result<(), AggregationError> {
    if categories.is_empty() {
        return Err(AggregationError::Configuration(
            "no place categories configured".to_string(),
        ));
    }
    Ok(())
}

/// Fans a nearby search out over categories and merges the results.
pub struct PlaceAggregator<P: PlacesClient> {
    client: P,
    api_key: ApiKey,
}

impl<P: PlacesClient> PlaceAggregator<P> {
    /// Creates an aggregator, validating the credential once.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::Configuration`] if the key is missing or
    /// blank.
    pub fn new(client: P, api_key: Option<&str>) -> Result<Self, AggregationError> {
        let api_key = api_key.and_then(ApiKey::new).ok_or_else(|| {
            AggregationError::Configuration("missing places API key".to_string())
        })?;
        Ok(Self::with_key(client, api_key))
    }

    /// Creates an aggregator from an already validated key.
    pub fn with_key(client: P, api_key: ApiKey) -> Self {
        Self { client, api_key }
    }

    /// The underlying places client.
    pub fn client(&self) -> &P {
        &self.client
    }

    /// Searches every category around `coordinate` and merges the results.
    ///
    /// Queries overlap; the merge order follows `categories`, then the
    /// provider's order. A place id seen in an earlier category is not
    /// repeated.
    ///
    /// # Errors
    ///
    /// - [`AggregationError::Configuration`] if `categories` is empty
    /// - [`AggregationError::TotalFailure`] if no category succeeded
    pub async fn fetch_nearby(
        &self,
        coordinate: Coordinate,
        categories: &[String],
        radius_meters: u32,
    ) -> Result<Aggregation, AggregationError> {
        validate_categories(categories)?;

        let queries: Vec<PlaceQuery> = categories
            .iter()
            .map(|category| PlaceQuery {
                location: coordinate,
                radius_meters,
                category: category.clone(),
                api_key: self.api_key.clone(),
            })
            .collect();

        debug!(
            provider = self.client.name(),
            %coordinate,
            radius_meters,
            categories = queries.len(),
            "Dispatching category queries"
        );

        // join_all yields results in input order regardless of completion order
        let responses = join_all(queries.iter().map(|q| self.client.search(q))).await;

        let mut seen = HashSet::new();
        let mut aggregation = Aggregation::default();
        let mut succeeded = 0usize;

        for (query, response) in queries.iter().zip(responses) {
            match classify(response) {
                Ok(response) => {
                    succeeded += 1;
                    let before = aggregation.places.len();
                    for raw in response.results {
                        match raw.into_place() {
                            Some(place) if seen.insert(place.id.clone()) => {
                                aggregation.places.push(place)
                            }
                            Some(place) => {
                                debug!(id = %place.id, category = %query.category, "Duplicate place skipped")
                            }
                            None => {
                                debug!(category = %query.category, "Incomplete place record skipped")
                            }
                        }
                    }
                    debug!(
                        category = %query.category,
                        places = aggregation.places.len() - before,
                        "Category query succeeded"
                    );
                }
                Err(reason) => {
                    warn!(category = %query.category, %reason, "Category query failed");
                    aggregation.failures.push(CategoryFailure {
                        category: query.category.clone(),
                        reason,
                    });
                }
            }
        }

        if succeeded == 0 {
            return Err(AggregationError::TotalFailure {
                failures: aggregation.failures,
            });
        }

        info!(
            places = aggregation.places.len(),
            failed_categories = aggregation.failures.len(),
            "Nearby places aggregated"
        );
        Ok(aggregation)
    }
}

fn classify(response: Result<SearchResponse, PlacesError>) -> Result<SearchResponse, FailureReason> {
    match response {
        Ok(response) if response.is_success() => Ok(response),
        Ok(response) => Err(FailureReason::Status {
            status: response.status,
            message: response.error_message,
        }),
        Err(e) => Err(FailureReason::Transport(e)),
    }
}
