//! Local/remote reconciliation.
//!
//! A `SyncOrchestrator` combines load requests with reachability and routes
//! each fetch to the API or to the cache. `MatchesSync` and `TeamsSync` bind
//! it to the repository.

pub mod orchestrator;
pub mod sources;

pub use orchestrator::{FetchResult, LoadState, SyncOrchestrator, SyncSource};
pub use sources::{MatchesSync, TeamsSync};
