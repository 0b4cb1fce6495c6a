//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that records every request and
//! serves scripted responses, so retry and re-authentication sequences can
//! be exercised deterministically without network access.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::traits::{HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Form parameters (for POST requests)
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Look up a form parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful response
    Success(Response),
    /// Return an error
    Error(HttpError),
}

/// Mock HTTP client for testing.
///
/// Responses can be configured two ways:
///
/// - [`set_response`](MockHttpClient::set_response) installs a *sticky*
///   response that is returned for every matching request;
/// - [`enqueue_response`](MockHttpClient::enqueue_response) pushes a
///   one-shot response consumed in FIFO order, taking precedence over the
///   sticky response. This is how token-invalidation retry sequences
///   ("login redirect, then real payload") are scripted.
///
/// URLs are matched exactly first, then by prefix.
///
/// # Example
///
/// ```ignore
/// use bellhop::adapters::mock::{MockHttpClient, MockResponse};
/// use bellhop::traits::{HttpClient, Response};
/// use bytes::Bytes;
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://game.example.com/main.php",
///     MockResponse::Success(Response::new(200, Bytes::from("Welcome back!"))),
/// );
///
/// let response = client.get("https://game.example.com/main.php").await?;
/// assert_eq!(response.status, 200);
/// assert_eq!(client.requests().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// One-shot scripted responses, consumed front-to-back
    queues: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Sticky responses by URL
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when nothing matches
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Install a sticky response for a URL.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a one-shot response for a URL.
    ///
    /// Queued responses are consumed before any sticky response for the
    /// same URL.
    pub fn enqueue_response(&self, url: &str, response: MockResponse) {
        let mut queues = self.queues.lock().unwrap();
        queues.entry(url.to_string()).or_default().push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get the recorded requests whose URL starts with `prefix`.
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Clear all configured responses (sticky, queued, and default).
    pub fn clear_responses(&self) {
        self.queues.lock().unwrap().clear();
        self.responses.lock().unwrap().clear();
        *self.default_response.lock().unwrap() = None;
    }

    /// Record a request.
    fn record_request(&self, method: &str, url: &str, params: &[(String, String)]) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            params: params.to_vec(),
        });
    }

    /// Get the response for a URL.
    fn response_for(&self, url: &str) -> Option<MockResponse> {
        {
            let mut queues = self.queues.lock().unwrap();

            // Exact queued match first
            if let Some(queue) = queues.get_mut(url) {
                if let Some(response) = queue.pop_front() {
                    return Some(response);
                }
            }

            // Then queued prefix match
            for (pattern, queue) in queues.iter_mut() {
                if url.starts_with(pattern.as_str()) {
                    if let Some(response) = queue.pop_front() {
                        return Some(response);
                    }
                }
            }
        }

        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern.as_str()) {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }

    fn resolve(&self, url: &str) -> Result<Response, HttpError> {
        match self.response_for(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.record_request("GET", url, &[]);
        self.resolve(url)
    }

    async fn post_form(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Response, HttpError> {
        self.record_request("POST", url, params);
        self.resolve(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_mock_http_client_new() {
        let client = MockHttpClient::new();
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_with_sticky_response() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://example.com/test",
            MockResponse::Success(Response::new(200, Bytes::from("Hello"))),
        );

        let response = client.get("https://example.com/test").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Bytes::from("Hello"));

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].url, "https://example.com/test");
    }

    #[tokio::test]
    async fn test_sticky_response_repeats() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://example.com/page",
            MockResponse::Success(Response::new(200, Bytes::from("same"))),
        );

        for _ in 0..3 {
            let response = client.get("https://example.com/page").await.unwrap();
            assert_eq!(response.body, Bytes::from("same"));
        }
    }

    #[tokio::test]
    async fn test_queued_responses_consumed_in_order() {
        let client = MockHttpClient::new();
        client.enqueue_response(
            "https://example.com/seq",
            MockResponse::Success(Response::new(200, Bytes::from("first"))),
        );
        client.enqueue_response(
            "https://example.com/seq",
            MockResponse::Success(Response::new(200, Bytes::from("second"))),
        );
        client.set_response(
            "https://example.com/seq",
            MockResponse::Success(Response::new(200, Bytes::from("sticky"))),
        );

        let r1 = client.get("https://example.com/seq").await.unwrap();
        let r2 = client.get("https://example.com/seq").await.unwrap();
        let r3 = client.get("https://example.com/seq").await.unwrap();

        assert_eq!(r1.body, Bytes::from("first"));
        assert_eq!(r2.body, Bytes::from("second"));
        assert_eq!(r3.body, Bytes::from("sticky"));
    }

    #[tokio::test]
    async fn test_error_response() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://example.com/down",
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );

        let result = client.get("https://example.com/down").await;
        assert!(matches!(result, Err(HttpError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_post_records_params() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Success(Response::new(200, Bytes::new())));

        let params = vec![
            ("pwd".to_string(), "token123".to_string()),
            ("graf".to_string(), "hello".to_string()),
        ];
        client
            .post_form("https://example.com/chat", &params)
            .await
            .unwrap();

        let requests = client.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].param("pwd"), Some("token123"));
        assert_eq!(requests[0].param("graf"), Some("hello"));
        assert_eq!(requests[0].param("missing"), None);
    }

    #[tokio::test]
    async fn test_no_response_configured() {
        let client = MockHttpClient::new();
        let result = client.get("https://example.com/missing").await;
        assert!(matches!(result, Err(HttpError::Other(_))));
    }

    #[tokio::test]
    async fn test_default_response() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Success(Response::new(
            404,
            Bytes::from("Not Found"),
        )));

        let response = client.get("https://example.com/anything").await.unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_prefix_match() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://example.com/api",
            MockResponse::Success(Response::new(200, Bytes::from("API response"))),
        );

        let response = client
            .get("https://example.com/api?what=status")
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_requests_to_filters_by_prefix() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Success(Response::new(200, Bytes::new())));

        client.get("https://example.com/a").await.unwrap();
        client.get("https://example.com/b").await.unwrap();
        client.get("https://example.com/a?x=1").await.unwrap();

        assert_eq!(client.requests_to("https://example.com/a").len(), 2);
        assert_eq!(client.requests_to("https://example.com/b").len(), 1);
    }

    #[test]
    fn test_clear_requests() {
        let client = MockHttpClient::new();
        client.record_request("GET", "https://example.com", &[]);
        assert_eq!(client.requests().len(), 1);

        client.clear_requests();
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_clear_responses() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://example.com",
            MockResponse::Success(Response::new(200, Bytes::new())),
        );
        client.clear_responses();
        assert!(client.response_for("https://example.com").is_none());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://example.com",
            MockResponse::Success(Response::new(200, Bytes::from("Hello"))),
        );

        let cloned = client.clone();
        let response = cloned.get("https://example.com").await.unwrap();
        assert_eq!(response.status, 200);

        // Both see the same recorded requests
        assert_eq!(client.requests().len(), 1);
        assert_eq!(cloned.requests().len(), 1);
    }
}
