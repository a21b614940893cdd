use std::sync::Arc;

use async_trait::async_trait;

use super::orchestrator::SyncSource;
use crate::error::AppError;
use crate::models::{Match, Team};
use crate::repository::Repository;

/// Reconciles the full match list.
#[derive(Clone)]
pub struct MatchesSync {
    repository: Arc<dyn Repository>,
}

impl MatchesSync {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl SyncSource for MatchesSync {
    type Item = Match;
    const NAME: &'static str = "matches";

    async fn fetch_remote(&self) -> Result<Vec<Match>, AppError> {
        self.repository.get_remote_matches().await
    }

    async fn fetch_local(&self) -> Result<Vec<Match>, AppError> {
        self.repository.get_local_matches(None).await
    }

    async fn persist(&self, items: &[Match]) -> Result<bool, AppError> {
        self.repository.save_matches(items).await
    }
}

/// Reconciles the team list.
#[derive(Clone)]
pub struct TeamsSync {
    repository: Arc<dyn Repository>,
}

impl TeamsSync {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl SyncSource for TeamsSync {
    type Item = Team;
    const NAME: &'static str = "teams";

    async fn fetch_remote(&self) -> Result<Vec<Team>, AppError> {
        self.repository.get_remote_teams().await
    }

    async fn fetch_local(&self) -> Result<Vec<Team>, AppError> {
        self.repository.get_local_teams().await
    }

    async fn persist(&self, items: &[Team]) -> Result<bool, AppError> {
        self.repository.save_teams(items).await
    }
}
