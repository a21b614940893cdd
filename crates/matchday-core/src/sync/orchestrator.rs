use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::AppError;

/// Buffer size for the input, completion and broadcast channels.
/// Each load produces one message; 32 leaves room for slow consumers.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Outcome of one fetch, shared by every subscriber.
pub type FetchResult<T> = Result<Vec<T>, AppError>;

/// The data an orchestrator reconciles, and where it comes from.
#[async_trait]
pub trait SyncSource: Send + Sync + 'static {
    type Item: Clone + fmt::Debug + Send + Sync + 'static;

    /// Used in log lines.
    const NAME: &'static str;

    async fn fetch_remote(&self) -> Result<Vec<Self::Item>, AppError>;
    async fn fetch_local(&self) -> Result<Vec<Self::Item>, AppError>;
    async fn persist(&self, items: &[Self::Item]) -> Result<bool, AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Success(Vec<T>),
    Failure(AppError),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

#[derive(Debug, Clone, Copy)]
enum Input {
    Trigger,
    Connectivity(bool),
}

struct Completion<T> {
    generation: u64,
    online: bool,
    result: FetchResult<T>,
}

/// Number of background saves still running.
type PendingSaves = Arc<watch::Sender<usize>>;

/// Holds one slot in [`PendingSaves`] until dropped.
struct SaveGuard(PendingSaves);

impl SaveGuard {
    fn new(pending: &PendingSaves) -> Self {
        pending.send_modify(|n| *n += 1);
        Self(Arc::clone(pending))
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

/// Publishing side of the orchestrator. Only the driver task touches it.
struct Outputs<T> {
    state: watch::Sender<LoadState<T>>,
    loading: watch::Sender<bool>,
    results: broadcast::Sender<FetchResult<T>>,
    errors: broadcast::Sender<AppError>,
}

impl<T: Clone> Outputs<T> {
    fn begin(&self) {
        self.loading.send_replace(true);
        self.state.send_replace(LoadState::Loading);
    }

    fn finish(&self, result: FetchResult<T>) {
        self.loading.send_replace(false);
        match &result {
            Ok(items) => {
                self.state.send_replace(LoadState::Success(items.clone()));
            }
            Err(e) => {
                self.state.send_replace(LoadState::Failure(e.clone()));
                // No subscribers is fine; the failure is still in `state`
                let _ = self.errors.send(e.clone());
            }
        }
        let _ = self.results.send(result);
    }
}

/// Decides between cached and fresh data for one kind of record.
///
/// Load triggers and connectivity values are combined latest-wins: once both
/// have been seen, every new value of either starts a fetch. Online fetches go
/// to the remote source and persist their result in the background; offline
/// fetches read the cache. Fetches are never cancelled, so a slow older fetch
/// can complete after a newer one.
///
/// All outputs are published from a single driver task. Call [`flush`](Self::flush)
/// before exiting so background saves are not cut short.
pub struct SyncOrchestrator<S: SyncSource> {
    inputs: mpsc::Sender<Input>,
    state: watch::Receiver<LoadState<S::Item>>,
    loading: watch::Receiver<bool>,
    saves: watch::Receiver<usize>,
    results: broadcast::Sender<FetchResult<S::Item>>,
    errors: broadcast::Sender<AppError>,
    driver: JoinHandle<()>,
}

impl<S: SyncSource> SyncOrchestrator<S> {
    /// Start the driver task. Must be called from within a Tokio runtime.
    pub fn spawn(source: S) -> Self {
        let (inputs, input_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (state_tx, state) = watch::channel(LoadState::Idle);
        let (loading_tx, loading) = watch::channel(false);
        let (saves_tx, saves) = watch::channel(0);
        let (results, _) = broadcast::channel(CHANNEL_BUFFER_SIZE);
        let (errors, _) = broadcast::channel(CHANNEL_BUFFER_SIZE);

        let outputs = Outputs {
            state: state_tx,
            loading: loading_tx,
            results: results.clone(),
            errors: errors.clone(),
        };
        let driver = tokio::spawn(drive(
            Arc::new(source),
            input_rx,
            outputs,
            Arc::new(saves_tx),
        ));

        Self {
            inputs,
            state,
            loading,
            saves,
            results,
            errors,
            driver,
        }
    }

    async fn send(&self, input: Input) {
        if self.inputs.send(input).await.is_err() {
            error!(source = S::NAME, ?input, "Sync driver stopped - input dropped");
        }
    }

    /// Ask for a (re)load with whatever connectivity is current.
    pub async fn request_load(&self) {
        self.send(Input::Trigger).await;
    }

    pub async fn set_reachable(&self, reachable: bool) {
        self.send(Input::Connectivity(reachable)).await;
    }

    /// Feed reachability changes into the orchestrator until `changes` ends.
    pub fn follow_connectivity<C>(&self, changes: C) -> JoinHandle<()>
    where
        C: Stream<Item = bool> + Send + 'static,
    {
        let inputs = self.inputs.clone();
        tokio::spawn(async move {
            let mut changes = Box::pin(changes);
            while let Some(reachable) = changes.next().await {
                if inputs.send(Input::Connectivity(reachable)).await.is_err() {
                    break;
                }
            }
        })
    }

    /// Wait until every background save started so far has finished.
    ///
    /// A save starts before its fetch result is published, so flushing after
    /// a result was received always covers that result's save.
    pub async fn flush(&self) {
        let mut saves = self.saves.clone();
        // Closed only once the driver and every save are gone
        let _ = saves.wait_for(|pending| *pending == 0).await;
    }

    /// Every fetch result from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FetchResult<S::Item>> {
        self.results.subscribe()
    }

    /// Every failure from now on.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<AppError> {
        self.errors.subscribe()
    }

    pub fn state(&self) -> watch::Receiver<LoadState<S::Item>> {
        self.state.clone()
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.clone()
    }
}

impl<S: SyncSource> Drop for SyncOrchestrator<S> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn drive<S: SyncSource>(
    source: Arc<S>,
    mut inputs: mpsc::Receiver<Input>,
    outputs: Outputs<S::Item>,
    saves: PendingSaves,
) {
    let (done_tx, mut done_rx) = mpsc::channel::<Completion<S::Item>>(CHANNEL_BUFFER_SIZE);
    let mut reachable: Option<bool> = None;
    let mut triggers: u64 = 0;
    let mut generation: u64 = 0;

    loop {
        tokio::select! {
            input = inputs.recv() => {
                match input {
                    Some(Input::Trigger) => triggers += 1,
                    Some(Input::Connectivity(value)) => reachable = Some(value),
                    None => break,
                }
                // Wait until both a trigger and a connectivity value have arrived
                let Some(online) = reachable else { continue };
                if triggers == 0 {
                    continue;
                }

                generation += 1;
                debug!(source = S::NAME, generation, online, "Starting fetch");
                outputs.begin();
                tokio::spawn(fetch(
                    Arc::clone(&source),
                    online,
                    generation,
                    done_tx.clone(),
                    Arc::clone(&saves),
                ));
            }
            Some(done) = done_rx.recv() => {
                match &done.result {
                    Ok(items) => info!(
                        source = S::NAME,
                        generation = done.generation,
                        online = done.online,
                        count = items.len(),
                        "Fetch succeeded"
                    ),
                    Err(e) => warn!(
                        source = S::NAME,
                        generation = done.generation,
                        online = done.online,
                        error = %e,
                        "Fetch failed"
                    ),
                }
                outputs.finish(done.result);
            }
        }
    }

    debug!(source = S::NAME, "Sync driver stopped");
}

async fn fetch<S: SyncSource>(
    source: Arc<S>,
    online: bool,
    generation: u64,
    done: mpsc::Sender<Completion<S::Item>>,
    saves: PendingSaves,
) {
    let result = if online {
        let result = source.fetch_remote().await;
        if let Ok(ref items) = result {
            persist_in_background(Arc::clone(&source), items.clone(), SaveGuard::new(&saves));
        }
        result
    } else {
        source.fetch_local().await
    };

    if done
        .send(Completion {
            generation,
            online,
            result,
        })
        .await
        .is_err()
    {
        debug!(source = S::NAME, generation, "Sync driver gone - result dropped");
    }
}

/// Save a fetched batch without holding up the result. Failures are only logged.
fn persist_in_background<S: SyncSource>(source: Arc<S>, items: Vec<S::Item>, guard: SaveGuard) {
    tokio::spawn(async move {
        let _guard = guard;
        match source.persist(&items).await {
            Ok(saved) => debug!(source = S::NAME, count = items.len(), saved, "Persisted fetched batch"),
            Err(e) => warn!(source = S::NAME, error = %e, "Failed to persist fetched batch"),
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
