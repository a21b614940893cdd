//! One interface over the remote API and the local cache.
//!
//! The sync layer only sees [`Repository`], so tests can swap in fakes for
//! either source or for the whole repository.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Match, Team};

/// Data fetched from the network.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_matches(&self) -> Result<Vec<Match>, AppError>;
    async fn fetch_teams(&self) -> Result<Vec<Team>, AppError>;
}

/// Data held in the local cache.
#[async_trait]
pub trait LocalSource: Send + Sync {
    /// Matches sorted by date, optionally only those `team` played in.
    async fn fetch_matches(&self, team: Option<&str>) -> Result<Vec<Match>, AppError>;
    async fn fetch_teams(&self) -> Result<Vec<Team>, AppError>;
    /// Appends the batch. `Ok(false)` when there was nothing to write.
    async fn save_matches(&self, matches: &[Match]) -> Result<bool, AppError>;
    async fn save_teams(&self, teams: &[Team]) -> Result<bool, AppError>;
}

#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_local_matches(&self, team: Option<&str>) -> Result<Vec<Match>, AppError>;
    async fn get_remote_matches(&self) -> Result<Vec<Match>, AppError>;
    async fn save_matches(&self, matches: &[Match]) -> Result<bool, AppError>;
    async fn get_local_teams(&self) -> Result<Vec<Team>, AppError>;
    async fn get_remote_teams(&self) -> Result<Vec<Team>, AppError>;
    async fn save_teams(&self, teams: &[Team]) -> Result<bool, AppError>;
}

/// Plain delegation to a remote and a local source.
#[derive(Clone)]
pub struct DataRepository {
    remote: Arc<dyn RemoteSource>,
    local: Arc<dyn LocalSource>,
}

impl DataRepository {
    pub fn new(remote: Arc<dyn RemoteSource>, local: Arc<dyn LocalSource>) -> Self {
        Self { remote, local }
    }
}

#[async_trait]
impl Repository for DataRepository {
    async fn get_local_matches(&self, team: Option<&str>) -> Result<Vec<Match>, AppError> {
        self.local.fetch_matches(team).await
    }

    async fn get_remote_matches(&self) -> Result<Vec<Match>, AppError> {
        self.remote.fetch_matches().await
    }

    async fn save_matches(&self, matches: &[Match]) -> Result<bool, AppError> {
        self.local.save_matches(matches).await
    }

    async fn get_local_teams(&self) -> Result<Vec<Team>, AppError> {
        self.local.fetch_teams().await
    }

    async fn get_remote_teams(&self) -> Result<Vec<Team>, AppError> {
        self.remote.fetch_teams().await
    }

    async fn save_teams(&self, teams: &[Team]) -> Result<bool, AppError> {
        self.local.save_teams(teams).await
    }
}
