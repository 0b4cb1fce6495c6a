//! HTTP client trait abstraction.
//!
//! Provides a trait-based abstraction for HTTP operations, enabling
//! dependency injection and mocking in tests. The remote game service only
//! speaks form-encoded POSTs and plain GETs, so that is all the trait
//! offers.

use async_trait::async_trait;
use bytes::Bytes;

/// Form parameters for a POST request, in submission order.
pub type FormParams = Vec<(String, String)>;

/// HTTP response wrapper.
///
/// The service signals success and failure through response *content*, not
/// status codes, so the body is always captured whole.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self { status, body }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as a string.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// HTTP client errors.
#[derive(Debug, Clone)]
pub enum HttpError {
    /// Connection failed
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// IO error
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for HTTP client operations.
///
/// Implementations include the production reqwest-based client (with a
/// cookie store, since the session token is cookie-bound) and a mock client
/// for tests.
///
/// # Example
///
/// ```ignore
/// use bellhop::traits::{HttpClient, HttpError};
///
/// async fn fetch_page<C: HttpClient>(client: &C) -> Result<String, HttpError> {
///     let response = client.get("https://game.example.com/main.php").await?;
///     response.text().map_err(|e| HttpError::Other(e.to_string()))
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request.
    async fn get(&self, url: &str) -> Result<Response, HttpError>;

    /// Perform a form-encoded POST request.
    ///
    /// Parameters are submitted in the order given; the service is
    /// order-sensitive for some endpoints.
    async fn post_form(&self, url: &str, params: &[(String, String)])
        -> Result<Response, HttpError>;
}
