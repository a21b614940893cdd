//! Reactive view models.
//!
//! Each view runs as a task that consumes its inputs and publishes its latest
//! output on a watch channel. Dropping the view stops the task.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::{Match, Team};
use crate::repository::Repository;
use crate::sync::FetchResult;

use super::items::{MatchItem, Snapshot, TeamFilter, TeamItem};
use super::projector::{project_matches, project_teams, TeamSummary};

/// Re-project whenever a new result or a new filter arrives.
///
/// Nothing is published until the first result; after that every input
/// produces a fresh snapshot. Ends when the result channel closes.
async fn combine<T, I>(
    mut results: broadcast::Receiver<FetchResult<T>>,
    mut filter: watch::Receiver<TeamFilter>,
    snapshot: watch::Sender<Snapshot<I>>,
    project: fn(&FetchResult<T>, &TeamFilter) -> Snapshot<I>,
) where
    T: Clone,
{
    let mut latest: Option<FetchResult<T>> = None;
    loop {
        tokio::select! {
            received = results.recv() => match received {
                Ok(result) => latest = Some(result),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "View fell behind, using newer results");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            changed = filter.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        // Mark the filter seen even when there is nothing to project yet
        let current = filter.borrow_and_update().clone();
        if let Some(result) = &latest {
            snapshot.send_replace(project(result, &current));
        }
    }
}

/// Grouped match list for the selected teams.
pub struct MatchesView {
    filter: watch::Sender<TeamFilter>,
    snapshot: watch::Receiver<Snapshot<MatchItem>>,
    task: JoinHandle<()>,
}

impl MatchesView {
    pub fn spawn(results: broadcast::Receiver<FetchResult<Match>>, filter: TeamFilter) -> Self {
        let (filter_tx, filter_rx) = watch::channel(filter);
        let (snapshot_tx, snapshot) = watch::channel(Snapshot::default());
        let task = tokio::spawn(combine(results, filter_rx, snapshot_tx, project_matches));
        Self {
            filter: filter_tx,
            snapshot,
            task,
        }
    }

    pub fn set_filter(&self, filter: TeamFilter) {
        self.filter.send_replace(filter);
    }

    pub fn filter(&self) -> TeamFilter {
        self.filter.borrow().clone()
    }

    pub fn snapshot(&self) -> watch::Receiver<Snapshot<MatchItem>> {
        self.snapshot.clone()
    }
}

impl Drop for MatchesView {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Team picker with selection state.
pub struct TeamsView {
    filter: watch::Sender<TeamFilter>,
    snapshot: watch::Receiver<Snapshot<TeamItem>>,
    apply_enabled: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl TeamsView {
    pub fn spawn(results: broadcast::Receiver<FetchResult<Team>>, filter: TeamFilter) -> Self {
        let (filter_tx, filter_rx) = watch::channel(filter);
        let (snapshot_tx, snapshot) = watch::channel(Snapshot::default());
        let (apply_tx, apply_enabled) = watch::channel(!filter_tx.borrow().is_empty());

        let mut selection = filter_tx.subscribe();
        let apply_task = tokio::spawn(async move {
            while selection.changed().await.is_ok() {
                let enabled = !selection.borrow_and_update().is_empty();
                apply_tx.send_replace(enabled);
            }
        });
        let project_task = tokio::spawn(combine(results, filter_rx, snapshot_tx, project_teams));

        Self {
            filter: filter_tx,
            snapshot,
            apply_enabled,
            tasks: vec![project_task, apply_task],
        }
    }

    pub fn set_filter(&self, filter: TeamFilter) {
        self.filter.send_replace(filter);
    }

    /// Flip the selection of one team by name.
    pub fn toggle(&self, team: &str) {
        self.filter.send_modify(|filter| filter.toggle(team));
    }

    pub fn filter(&self) -> TeamFilter {
        self.filter.borrow().clone()
    }

    pub fn snapshot(&self) -> watch::Receiver<Snapshot<TeamItem>> {
        self.snapshot.clone()
    }

    /// True while at least one team is selected.
    pub fn apply_enabled(&self) -> watch::Receiver<bool> {
        self.apply_enabled.clone()
    }
}

impl Drop for TeamsView {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Load one team's cached matches and summarise them.
pub async fn load_team_summary(
    repository: &dyn Repository,
    team: &str,
) -> Result<TeamSummary, AppError> {
    let matches = repository.get_local_matches(Some(team)).await?;
    debug!(team, count = matches.len(), "Team matches loaded");
    Ok(TeamSummary::from_matches(team, &matches))
}

/// Summary for a single team, reloaded from the cache on request.
pub struct TeamDetailView {
    team: String,
    triggers: mpsc::Sender<()>,
    summary: watch::Receiver<Option<Result<TeamSummary, AppError>>>,
    task: JoinHandle<()>,
}

impl TeamDetailView {
    pub fn spawn(team: impl Into<String>, repository: Arc<dyn Repository>) -> Self {
        let team = team.into();
        // One queued reload covers any number of requests made while loading
        let (triggers, mut trigger_rx) = mpsc::channel::<()>(1);
        let (summary_tx, summary) = watch::channel(None);

        let name = team.clone();
        let task = tokio::spawn(async move {
            while trigger_rx.recv().await.is_some() {
                let result = load_team_summary(repository.as_ref(), &name).await;
                if let Err(e) = &result {
                    warn!(team = %name, error = %e, "Failed to load team summary");
                }
                summary_tx.send_replace(Some(result));
            }
        });

        Self {
            team,
            triggers,
            summary,
            task,
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn request_load(&self) {
        match self.triggers.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!(team = %self.team, "Team detail reload already queued");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!(team = %self.team, "Team detail task stopped - load ignored");
            }
        }
    }

    /// `None` until the first load finishes.
    pub fn summary(&self) -> watch::Receiver<Option<Result<TeamSummary, AppError>>> {
        self.summary.clone()
    }
}

impl Drop for TeamDetailView {
    fn drop(&mut self) {
        self.task.abort();
    }
}
