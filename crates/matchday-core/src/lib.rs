//! Matchday Core Library
//!
//! Shared code for football match and team data: the API client, the local
//! cache, and the layer that reconciles the two.
//!
//! Data flows one way. A [`SyncOrchestrator`] combines load requests with
//! network reachability, fetches through the [`Repository`] (remote when
//! online, cached when not), saves remote results back to the cache, and
//! broadcasts each result. Views in [`presentation`] turn those results into
//! filtered, grouped snapshots.

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod models;
pub mod presentation;
pub mod repository;
pub mod sync;
pub mod utils;

pub use api::ApiClient;
pub use cache::{CacheStore, LocalDataSource};
pub use config::Config;
pub use connectivity::{ConnectivityError, ConnectivityMonitor, Probe, TcpProbe};
pub use error::AppError;
pub use models::{Match, MatchType, Team};
pub use presentation::{
    MatchItem, MatchesView, Section, Snapshot, TeamDetailView, TeamFilter, TeamItem, TeamSummary,
    TeamsView,
};
pub use repository::{DataRepository, LocalSource, RemoteSource, Repository};
pub use sync::{FetchResult, LoadState, MatchesSync, SyncOrchestrator, SyncSource, TeamsSync};
