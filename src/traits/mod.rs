//! Trait abstractions for dependency injection and testability.
//!
//! This module provides trait-based abstractions for core functionality,
//! enabling dependency injection, mocking, and better testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP operations against the game service (GET, form POST)

pub mod http;

pub use http::{FormParams, HttpClient, HttpError, Response};
