//! Local caching module for offline data access.
//!
//! `CacheStore` is the persistence engine: typed tables of JSON records,
//! in memory or mirrored to a cache directory. `LocalDataSource` maps matches
//! and teams onto it.
//!
//! Cached tables:
//! - matches (sorted by date on read, filterable by team)
//! - teams

pub mod local;
pub mod store;

pub use local::{CacheAges, LocalDataSource};
pub use store::{age_display, CacheStore, CachedData, Entity, FetchRequest};
