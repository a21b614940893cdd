use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::AppError;

/// A record type the store can hold. Each entity lives in its own table.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_display(&self) -> String {
        age_display(self.cached_at)
    }
}

/// Human readable age of a cache write, e.g. "5m ago".
pub fn age_display(cached_at: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - cached_at).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Describes which records to return from a table and in what order.
pub struct FetchRequest<T> {
    predicate: Option<Predicate<T>>,
    sort: Option<Comparator<T>>,
    limit: Option<usize>,
}

impl<T> FetchRequest<T> {
    /// Every record, in insertion order.
    pub fn all() -> Self {
        Self {
            predicate: None,
            sort: None,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Stable sort applied after filtering.
    pub fn sort_by(mut self, compare: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        self.sort = Some(Box::new(compare));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn apply(&self, mut records: Vec<T>) -> Vec<T> {
        if let Some(ref predicate) = self.predicate {
            records.retain(|r| predicate(r));
        }
        if let Some(ref compare) = self.sort {
            records.sort_by(|a, b| compare(a, b));
        }
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }
        records
    }
}

impl<T> Default for FetchRequest<T> {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Default, Clone)]
struct Table {
    records: Vec<Value>,
    cached_at: Option<DateTime<Utc>>,
}

/// Local persistence engine.
///
/// Tables are kept in memory and, when opened on a directory, mirrored to one
/// JSON file per entity. Saves append; nothing is ever updated in place.
pub struct CacheStore {
    cache_dir: Option<PathBuf>,
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl CacheStore {
    /// Open a store backed by `cache_dir`, creating the directory if needed.
    pub fn open(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self {
            cache_dir: Some(cache_dir),
            tables: RwLock::new(HashMap::new()),
        })
    }

    /// A store that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            cache_dir: None,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    fn table_path(&self, name: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", name)))
    }

    async fn read_table(&self, name: &'static str) -> Result<Table> {
        let Some(path) = self.table_path(name) else {
            return Ok(Table::default());
        };
        tokio::task::spawn_blocking(move || read_table_file(&path, name))
            .await
            .with_context(|| format!("Cache read task failed: {}", name))?
    }

    async fn write_table(&self, name: &'static str, table: &CachedData<&[Value]>) -> Result<()> {
        let Some(path) = self.table_path(name) else {
            return Ok(());
        };
        let contents = serde_json::to_string_pretty(table)?;
        tokio::task::spawn_blocking(move || write_table_file(&path, name, contents))
            .await
            .with_context(|| format!("Cache write task failed: {}", name))?
    }

    async fn loaded_table(&self, name: &'static str) -> Result<Table> {
        if let Some(table) = self.tables.read().await.get(name) {
            return Ok(table.clone());
        }
        let mut tables = self.tables.write().await;
        if let Some(table) = tables.get(name) {
            return Ok(table.clone());
        }
        let table = self.read_table(name).await?;
        tables.insert(name, table.clone());
        Ok(table)
    }

    /// Fetch the records of `T` that satisfy `request`.
    pub async fn fetch<T: Entity>(&self, request: &FetchRequest<T>) -> Result<Vec<T>, AppError> {
        let table = self
            .loaded_table(T::TABLE)
            .await
            .map_err(|e| AppError::DbFetchError(format!("{:#}", e)))?;

        let records = table
            .records
            .into_iter()
            .map(serde_json::from_value::<T>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::DbFetchError(format!("Corrupt {} record: {}", T::TABLE, e)))?;

        let records = request.apply(records);
        debug!(table = T::TABLE, count = records.len(), "Fetched cached records");
        Ok(records)
    }

    /// Append `records` to the table of `T` as one batch.
    ///
    /// Returns `Ok(false)` when there is nothing to write. On a write failure
    /// the batch is discarded and the table is left as it was.
    pub async fn save<T: Entity>(&self, records: &[T]) -> Result<bool, AppError> {
        self.write_batch(records, WriteMode::Append).await
    }

    /// Make `records` the whole content of the table of `T`.
    ///
    /// Same contract as [`save`](Self::save): an empty batch writes nothing
    /// and a failed write keeps the previous content.
    pub async fn replace<T: Entity>(&self, records: &[T]) -> Result<bool, AppError> {
        self.write_batch(records, WriteMode::Replace).await
    }

    async fn write_batch<T: Entity>(&self, records: &[T], mode: WriteMode) -> Result<bool, AppError> {
        if records.is_empty() {
            return Ok(false);
        }

        let batch = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::DbInsertError(e.to_string()))?;

        let mut tables = self.tables.write().await;
        let mut table = match (mode, tables.get(T::TABLE)) {
            (WriteMode::Replace, _) => Table::default(),
            (WriteMode::Append, Some(table)) => table.clone(),
            (WriteMode::Append, None) => self
                .read_table(T::TABLE)
                .await
                .map_err(|e| AppError::DbInsertError(format!("{:#}", e)))?,
        };

        table.records.extend(batch);
        let cached = CachedData::new(table.records.as_slice());
        self.write_table(T::TABLE, &cached)
            .await
            .map_err(|e| AppError::DbInsertError(format!("{:#}", e)))?;

        table.cached_at = Some(cached.cached_at);
        let total = table.records.len();
        tables.insert(T::TABLE, table);

        debug!(table = T::TABLE, ?mode, added = records.len(), total, "Saved records to cache");
        Ok(true)
    }

    /// When the table of `T` was last written, if ever.
    pub async fn cached_at<T: Entity>(&self) -> Option<DateTime<Utc>> {
        match self.loaded_table(T::TABLE).await {
            Ok(table) => table.cached_at,
            Err(e) => {
                debug!(table = T::TABLE, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    /// Age of the table of `T` for display, `None` if it was never written.
    pub async fn age<T: Entity>(&self) -> Option<String> {
        self.cached_at::<T>().await.map(age_display)
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Append,
    Replace,
}

fn read_table_file(path: &Path, name: &str) -> Result<Table> {
    if !path.exists() {
        return Ok(Table::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cache file: {}", name))?;
    let cached: CachedData<Vec<Value>> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse cache file: {}", name))?;

    Ok(Table {
        records: cached.data,
        cached_at: Some(cached.cached_at),
    })
}

fn write_table_file(path: &Path, name: &str, contents: String) -> Result<()> {
    // Write beside the target and rename so a failed write leaves the old table intact
    let staging = path.with_extension("json.tmp");
    std::fs::write(&staging, contents)
        .with_context(|| format!("Failed to write cache file: {}", name))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("Failed to replace cache file: {}", name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        text: String,
    }

    impl Entity for Note {
        const TABLE: &'static str = "notes";
    }

    fn note(id: u32, text: &str) -> Note {
        Note {
            id,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_age_display_buckets() {
        assert_eq!(age_display(Utc::now() - Duration::minutes(5)), "5m ago");
        assert_eq!(age_display(Utc::now() - Duration::minutes(61)), "1h ago");
        assert_eq!(age_display(Utc::now() - Duration::minutes(95)), "2h ago");
        assert_eq!(age_display(Utc::now() - Duration::hours(25)), "1d ago");
        assert_eq!(age_display(Utc::now() - Duration::hours(37)), "2d ago");
        assert_eq!(age_display(Utc::now() + Duration::minutes(10)), "just now");
    }

    #[tokio::test]
    async fn test_save_empty_batch_reports_false() {
        let store = CacheStore::in_memory();
        assert_eq!(store.save::<Note>(&[]).await, Ok(false));
        assert!(store.fetch(&FetchRequest::<Note>::all()).await.unwrap().is_empty());
        assert_eq!(store.age::<Note>().await, None);
    }

    #[tokio::test]
    async fn test_save_appends_without_dedup() {
        let store = CacheStore::in_memory();
        assert_eq!(store.save(&[note(1, "a"), note(2, "b")]).await, Ok(true));
        assert_eq!(store.save(&[note(1, "a")]).await, Ok(true));

        let all = store.fetch(&FetchRequest::<Note>::all()).await.unwrap();
        assert_eq!(all, vec![note(1, "a"), note(2, "b"), note(1, "a")]);
        assert_eq!(store.age::<Note>().await.as_deref(), Some("just now"));
    }

    #[tokio::test]
    async fn test_replace_overwrites_table() {
        let store = CacheStore::in_memory();
        store.save(&[note(1, "a"), note(2, "b")]).await.unwrap();
        assert_eq!(store.replace(&[note(1, "a"), note(2, "b")]).await, Ok(true));
        assert_eq!(store.replace(&[note(1, "a"), note(2, "b")]).await, Ok(true));

        let all = store.fetch(&FetchRequest::<Note>::all()).await.unwrap();
        assert_eq!(all, vec![note(1, "a"), note(2, "b")]);

        // Nothing to write keeps what is there
        assert_eq!(store.replace::<Note>(&[]).await, Ok(false));
        assert_eq!(store.fetch(&FetchRequest::<Note>::all()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path().to_path_buf()).unwrap();
        store.replace(&[note(1, "a")]).await.unwrap();

        std::fs::create_dir(dir.path().join("notes.json.tmp")).unwrap();
        let err = store.replace(&[note(2, "b")]).await.unwrap_err();
        assert!(matches!(err, AppError::DbInsertError(_)));
        assert_eq!(store.fetch(&FetchRequest::<Note>::all()).await.unwrap(), vec![note(1, "a")]);

        let reopened = CacheStore::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.fetch(&FetchRequest::<Note>::all()).await.unwrap(), vec![note(1, "a")]);
    }

    #[tokio::test]
    async fn test_fetch_filter_sort_limit() {
        let store = CacheStore::in_memory();
        store
            .save(&[note(3, "c"), note(1, "a"), note(4, "skip"), note(2, "b")])
            .await
            .unwrap();

        let request = FetchRequest::<Note>::all()
            .filter(|n| n.text != "skip")
            .sort_by(|a, b| a.id.cmp(&b.id))
            .limit(2);
        let fetched = store.fetch(&request).await.unwrap();
        assert_eq!(fetched, vec![note(1, "a"), note(2, "b")]);
    }

    #[tokio::test]
    async fn test_directory_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = CacheStore::open(dir.path().to_path_buf()).unwrap();
            store.save(&[note(1, "a")]).await.unwrap();
        }
        assert!(dir.path().join("notes.json").exists());

        let reopened = CacheStore::open(dir.path().to_path_buf()).unwrap();
        reopened.save(&[note(2, "b")]).await.unwrap();
        let all = reopened.fetch(&FetchRequest::<Note>::all()).await.unwrap();
        assert_eq!(all, vec![note(1, "a"), note(2, "b")]);
        assert!(reopened.cached_at::<Note>().await.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), "not json").unwrap();
        let store = CacheStore::open(dir.path().to_path_buf()).unwrap();

        let err = store.fetch(&FetchRequest::<Note>::all()).await.unwrap_err();
        assert!(matches!(err, AppError::DbFetchError(ref msg) if msg.contains("notes")));
    }

    #[tokio::test]
    async fn test_failed_write_is_insert_error_and_leaves_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path().to_path_buf()).unwrap();
        store.save(&[note(1, "a")]).await.unwrap();

        // A directory where the staging file should go makes the write fail
        std::fs::create_dir(dir.path().join("notes.json.tmp")).unwrap();
        let err = store.save(&[note(2, "b")]).await.unwrap_err();
        assert!(matches!(err, AppError::DbInsertError(_)));

        let all = store.fetch(&FetchRequest::<Note>::all()).await.unwrap();
        assert_eq!(all, vec![note(1, "a")]);
    }
}
