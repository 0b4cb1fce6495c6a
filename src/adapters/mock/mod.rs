//! Mock implementations for testing.
//!
//! This module provides mock implementations of the trait abstractions,
//! enabling unit testing without network dependencies.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted responses and request
//!   recording

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
