//! REST API client module for the Phantom backend.
//!
//! This module provides the `ApiClient` for talking to the backend's
//! versioned JSON API: ghosts, profile, dashboard aggregations, and market
//! lookups. Requests carry the session's bearer token and recover from an
//! expired access token with a single transparent refresh-and-retry.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
