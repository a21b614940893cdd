//! REST API client module for the football data service.
//!
//! This module provides the `ApiClient` for fetching matches and teams.
//! Non-2xx statuses, transport failures and malformed bodies are all
//! reported as `AppError` variants.

pub mod client;

pub use client::{ApiClient, DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};
