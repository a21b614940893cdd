use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::store::{CacheStore, Entity, FetchRequest};
use crate::error::AppError;
use crate::models::{Match, MatchType, Team};
use crate::repository::LocalSource;

/// Stored form of a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MatchRecord {
    identifier: String,
    date: Option<DateTime<Utc>>,
    desc: Option<String>,
    home: Option<String>,
    away: Option<String>,
    winner: Option<String>,
    highlights: Option<String>,
    #[serde(rename = "type", default)]
    kind: i64,
}

impl Entity for MatchRecord {
    const TABLE: &'static str = "matches";
}

impl From<&Match> for MatchRecord {
    fn from(m: &Match) -> Self {
        Self {
            identifier: m.identifier(),
            date: m.date,
            desc: m.description.clone(),
            home: m.home.clone(),
            away: m.away.clone(),
            winner: m.winner.clone(),
            highlights: m.highlights.clone(),
            kind: m.match_type.code(),
        }
    }
}

impl From<MatchRecord> for Match {
    fn from(r: MatchRecord) -> Self {
        Self {
            date: r.date,
            description: r.desc,
            home: r.home,
            winner: r.winner,
            away: r.away,
            highlights: r.highlights,
            match_type: MatchType::from_code(r.kind),
        }
    }
}

/// Stored form of a team, keyed by the team id.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TeamRecord {
    identifier: String,
    name: Option<String>,
    logo: Option<String>,
}

impl Entity for TeamRecord {
    const TABLE: &'static str = "teams";
}

impl From<&Team> for TeamRecord {
    fn from(t: &Team) -> Self {
        Self {
            identifier: t.id.clone(),
            name: t.name.clone(),
            logo: t.logo.clone(),
        }
    }
}

impl From<TeamRecord> for Team {
    fn from(r: TeamRecord) -> Self {
        Self {
            id: r.identifier,
            name: r.name,
            logo: r.logo,
        }
    }
}

/// Matches and teams read from and written to the local cache.
#[derive(Clone)]
pub struct LocalDataSource {
    store: Arc<CacheStore>,
}

impl LocalDataSource {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    pub async fn cache_ages(&self) -> CacheAges {
        CacheAges {
            matches: self.store.age::<MatchRecord>().await,
            teams: self.store.age::<TeamRecord>().await,
        }
    }
}

#[async_trait]
impl LocalSource for LocalDataSource {
    async fn fetch_matches(&self, team: Option<&str>) -> Result<Vec<Match>, AppError> {
        let mut request = FetchRequest::<MatchRecord>::all().sort_by(|a, b| a.date.cmp(&b.date));
        if let Some(team) = team {
            let team = team.to_string();
            request = request.filter(move |r| {
                r.home.as_deref() == Some(team.as_str()) || r.away.as_deref() == Some(team.as_str())
            });
        }
        let records = self.store.fetch(&request).await?;
        debug!(team = ?team, count = records.len(), "Loaded matches from cache");
        Ok(records.into_iter().map(Match::from).collect())
    }

    async fn fetch_teams(&self) -> Result<Vec<Team>, AppError> {
        let records = self.store.fetch(&FetchRequest::<TeamRecord>::all()).await?;
        Ok(records.into_iter().map(Team::from).collect())
    }

    async fn save_matches(&self, matches: &[Match]) -> Result<bool, AppError> {
        let records: Vec<MatchRecord> = matches.iter().map(MatchRecord::from).collect();
        self.store.save(&records).await
    }

    /// The team list is replaced as a whole, one record per team id.
    async fn save_teams(&self, teams: &[Team]) -> Result<bool, AppError> {
        let mut seen = HashSet::new();
        let records: Vec<TeamRecord> = teams
            .iter()
            .filter(|t| seen.insert(t.id.as_str()))
            .map(TeamRecord::from)
            .collect();
        self.store.replace(&records).await
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheAges {
    pub matches: Option<String>,
    pub teams: Option<String>,
}

impl CacheAges {
    pub fn matches_age(&self) -> String {
        self.matches.clone().unwrap_or_else(|| "never".to_string())
    }

    pub fn teams_age(&self) -> String {
        self.teams.clone().unwrap_or_else(|| "never".to_string())
    }
}
