//! Network reachability monitoring.
//!
//! `ConnectivityMonitor` polls a [`Probe`] once started and broadcasts each
//! change of reachability. Nothing is probed before `start`, and nothing is
//! delivered synchronously: the first value arrives after the first probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Buffer size for reachability events.
/// Reachability flips rarely; a slow subscriber only ever needs the latest few.
const EVENT_BUFFER_SIZE: usize = 16;

/// Default poll interval for the reachability probe.
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 5;

/// Default connect timeout for [`TcpProbe`].
const PROBE_TIMEOUT_SECS: u64 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error("connectivity monitor is already running")]
    AlreadyRunning,

    #[error("no async runtime available to run the connectivity monitor")]
    NoRuntime,

    #[error("probe interval must be greater than zero")]
    InvalidInterval,
}

/// Decides whether the network is currently usable.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn is_reachable(&self) -> bool;
}

/// Reachable when a TCP connection to `addr` can be opened in time.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn is_reachable(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "Probe connection failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, "Probe connection timed out");
                false
            }
        }
    }
}

pub struct ConnectivityMonitor {
    probe: Arc<dyn Probe>,
    interval: Duration,
    events: broadcast::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ConnectivityMonitor {
    pub fn new(probe: impl Probe, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            probe: Arc::new(probe),
            interval,
            events,
            task: None,
        }
    }

    /// Begin probing. Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> Result<(), ConnectivityError> {
        if self.is_running() {
            return Err(ConnectivityError::AlreadyRunning);
        }
        if self.interval.is_zero() {
            return Err(ConnectivityError::InvalidInterval);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConnectivityError::NoRuntime)?;

        let probe = Arc::clone(&self.probe);
        let events = self.events.clone();
        let interval = self.interval;

        self.task = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last: Option<bool> = None;
            loop {
                ticker.tick().await;
                let reachable = probe.is_reachable().await;
                if last == Some(reachable) {
                    continue;
                }
                last = Some(reachable);
                info!(reachable, "Connectivity changed");
                // No subscribers is fine; the next change is sent again
                let _ = events.send(reachable);
            }
        }));

        info!(interval_ms = interval.as_millis() as u64, "Connectivity monitor started");
        Ok(())
    }

    /// Stop probing. `start` may be called again afterwards.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Connectivity monitor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Receive every reachability change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.events.subscribe()
    }

    /// Reachability changes as a stream. Ends when the monitor is dropped.
    pub fn changes(&self) -> impl Stream<Item = bool> + Send + 'static {
        stream::unfold(self.subscribe(), |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(reachable) => return Some((reachable, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Connectivity subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
