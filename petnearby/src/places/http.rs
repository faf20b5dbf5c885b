//! HTTP client abstraction for testability

use std::time::Duration;

use super::types::PlacesError;
use crate::BoxFuture;

/// Default request timeout for places queries.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Trait for async HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, PlacesError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, PlacesError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, PlacesError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                PlacesError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, PlacesError>> {
        let request = self.client.get(url);
        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| PlacesError::HttpError(format!("Request failed: {}", e)))?;

            // Check HTTP status
            let status = response.status();
            if !status.is_success() {
                return Err(PlacesError::HttpError(format!("HTTP {}", status)));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| PlacesError::HttpError(format!("Failed to read response: {}", e)))
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Mock HTTP client for testing. Records every requested URL.
    #[derive(Clone)]
    pub struct MockAsyncHttpClient {
        pub response: Result<Vec<u8>, PlacesError>,
        pub requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockAsyncHttpClient {
        pub fn new(response: Result<Vec<u8>, PlacesError>) -> Self {
            Self {
                response,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        fn get(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, PlacesError>> {
            self.requests.lock().unwrap().push(url.to_string());
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockAsyncHttpClient::new(Ok(vec![1, 2, 3, 4]));

        let result = mock.get("http://example.com").await;
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.requested_urls(), vec!["http://example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let mock = MockAsyncHttpClient::new(Err(PlacesError::HttpError("Test error".to_string())));

        let result = mock.get("http://example.com").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(AsyncReqwestClient::with_timeout(5).is_ok());
    }
}
