//! API client for the football data service.
//!
//! This module provides the `ApiClient` struct for fetching matches and teams.
//! The service needs no authentication; every call is a plain JSON GET.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;
use crate::models::{Match, MatchesEnvelope, Team, TeamsEnvelope};
use crate::repository::RemoteSource;

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the football data service
pub const DEFAULT_BASE_URL: &str = "https://jmde6xvjr4.execute-api.us-east-1.amazonaws.com";

/// HTTP request timeout in seconds.
/// The transport timeout is the only timeout applied to a fetch.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const MATCHES_PATH: &str = "/teams/matches";
const TEAMS_PATH: &str = "/teams";

/// API client for the football data service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the default service endpoint
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Create a client for another endpoint, e.g. a staging server.
    /// The base URL is only validated when a request is built.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::TransportFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Append a resource path to the base URL's own path.
    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url).map_err(|_| AppError::BadRequest)?;
        if url.cannot_be_a_base() {
            return Err(AppError::BadRequest);
        }
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        Ok(url)
    }

    /// Check if response is successful, mapping the status to an error if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(
            status = status.as_u16(),
            body = %AppError::truncate_body(&body),
            "API request failed"
        );
        Err(AppError::from_status(status.as_u16()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.endpoint(path)?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::TransportFailed(e.to_string()))?;

        Ok(serde_json::from_slice(&body)?)
    }

    // ===== Data Fetching Methods =====

    /// Fetch previous and upcoming matches as one list
    pub async fn fetch_matches(&self) -> Result<Vec<Match>, AppError> {
        let envelope: MatchesEnvelope = self.get(MATCHES_PATH).await?;
        let matches = envelope.into_matches();
        debug!(count = matches.len(), "Matches fetched");
        Ok(matches)
    }

    /// Fetch all teams
    pub async fn fetch_teams(&self) -> Result<Vec<Team>, AppError> {
        let envelope: TeamsEnvelope = self.get(TEAMS_PATH).await?;
        let teams = envelope.into_teams();
        debug!(count = teams.len(), "Teams fetched");
        Ok(teams)
    }
}

#[async_trait]
impl RemoteSource for ApiClient {
    async fn fetch_matches(&self) -> Result<Vec<Match>, AppError> {
        ApiClient::fetch_matches(self).await
    }

    async fn fetch_teams(&self) -> Result<Vec<Team>, AppError> {
        ApiClient::fetch_teams(self).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_base_url(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_appends_path() {
        let api = client("https://api.example.com");
        assert_eq!(
            api.endpoint(MATCHES_PATH).unwrap().as_str(),
            "https://api.example.com/teams/matches"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("https://api.example.com/v1/");
        assert_eq!(
            api.endpoint(TEAMS_PATH).unwrap().as_str(),
            "https://api.example.com/v1/teams"
        );
    }

    #[test]
    fn test_endpoint_rejects_unusable_base() {
        assert_eq!(client("not a url").endpoint(TEAMS_PATH), Err(AppError::BadRequest));
        assert_eq!(client("mailto:fan@example.com").endpoint(TEAMS_PATH), Err(AppError::BadRequest));
    }

    #[tokio::test]
    async fn test_bad_base_url_fails_before_network() {
        let api = client("::::");
        assert_eq!(api.fetch_matches().await, Err(AppError::BadRequest));
        assert_eq!(api.fetch_teams().await, Err(AppError::BadRequest));
    }

    #[test]
    fn test_default_client() {
        let api = ApiClient::new().unwrap();
        assert_eq!(
            api.endpoint(TEAMS_PATH).unwrap().as_str(),
            format!("{}/teams", DEFAULT_BASE_URL.trim_end_matches('/'))
        );
    }
}
