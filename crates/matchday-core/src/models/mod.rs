//! Data models for football entities.
//!
//! - `Team`: a club with its logo
//! - `Match`, `MatchType`: fixtures, previous or upcoming
//! - `MatchesEnvelope`, `TeamsEnvelope`: API response wrappers

pub mod matches;
pub mod team;

pub use matches::{Match, MatchType, MatchesEnvelope};
pub use team::{Team, TeamsEnvelope};
