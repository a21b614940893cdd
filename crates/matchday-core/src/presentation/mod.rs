//! Display-ready projections of fetched data.
//!
//! - `items`: sections, rows and the team filter
//! - `projector`: pure grouping, filtering and summaries
//! - `views`: tasks that keep a projection current as inputs change

pub mod items;
pub mod projector;
pub mod views;

pub use items::{MatchItem, Section, Snapshot, TeamFilter, TeamItem};
pub use projector::{project_matches, project_teams, select_matches, TeamSummary};
pub use views::{load_team_summary, MatchesView, TeamDetailView, TeamsView};
