//! Notification pollers for live status characteristics.
//!
//! While a peer is subscribed, a background task samples system status and
//! pushes every successful sample to the host stack:
//!
//! ```text
//! StartNotify ─► sample ─ok─► publish ─► sleep 3s ─┐
//!                  ▲   └─err─► log ───► sleep 5s ─┤
//!                  └───────────────────────────────┘
//! StopNotify ──► cancel ─► await task exit
//! ```
//!
//! Every successful sample is published, changed or not.

mod linux;

pub use linux::{parse_essid, parse_inet, LinuxStatusProvider};

use crate::gatt::ObjectPath;
use crate::host::NotificationSink;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Delay between successful samples.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Delay after a failed sample.
pub const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Upper bound on a single sample.
pub const SAMPLE_TIMEOUT: Duration = Duration::from_secs(10);

/// A live status value that can be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// Name of the network the wireless interface is associated with.
    NetworkName,
    /// Address of the wireless interface.
    InterfaceAddress,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkName => write!(f, "network name"),
            Self::InterfaceAddress => write!(f, "interface address"),
        }
    }
}

/// Source of live system status.
#[async_trait]
pub trait SystemStatusProvider: Send + Sync + 'static {
    async fn sample(&self, kind: StatusKind) -> Result<String, SampleError>;
}

/// Errors sampling system status. Always transient.
#[derive(Debug)]
pub enum SampleError {
    /// Spawning or reading the helper process failed.
    Io(std::io::Error),
    /// Helper output contained no value.
    NoMatch(StatusKind),
    /// Sample did not finish within [`SAMPLE_TIMEOUT`].
    Timeout,
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::NoMatch(kind) => write!(f, "no {} found", kind),
            Self::Timeout => write!(f, "sample timed out"),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SampleError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Where a poller publishes its samples.
#[derive(Clone)]
pub struct PollTarget {
    pub kind: StatusKind,
    pub path: ObjectPath,
    pub provider: Arc<dyn SystemStatusProvider>,
    pub sink: Arc<dyn NotificationSink>,
}

struct ActivePoller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Notification state for one characteristic: at most one live poller.
#[derive(Default)]
pub struct NotificationSession {
    active: Mutex<Option<ActivePoller>>,
}

impl NotificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start polling. No-op if already active.
    ///
    /// Returns true if a poller was spawned.
    pub async fn start(&self, target: PollTarget) -> bool {
        let mut active = self.active.lock().await;
        if active.is_some() {
            debug!("{} poller already active", target.kind);
            return false;
        }

        info!("Starting {} notifications", target.kind);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(target, cancel.clone()));
        *active = Some(ActivePoller { cancel, task });
        true
    }

    /// Stop polling and wait for the task to exit. No-op if inactive.
    ///
    /// Returns true if a poller was stopped.
    pub async fn stop(&self) -> bool {
        // Held until the task exits so a concurrent start cannot overlap it
        let mut active = self.active.lock().await;
        let Some(poller) = active.take() else {
            return false;
        };

        poller.cancel.cancel();
        if let Err(e) = poller.task.await {
            warn!("Poller task ended abnormally: {}", e);
        }
        true
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

async fn poll_loop(target: PollTarget, cancel: CancellationToken) {
    loop {
        let delay = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = tokio::time::timeout(SAMPLE_TIMEOUT, target.provider.sample(target.kind)) => {
                match result.unwrap_or(Err(SampleError::Timeout)) {
                    Ok(value) => {
                        debug!("{}: {}", target.kind, value);
                        target.sink.value_changed(&target.path, value.into_bytes());
                        POLL_INTERVAL
                    }
                    Err(e) => {
                        warn!("Failed to sample {}: {}", target.kind, e);
                        POLL_BACKOFF
                    }
                }
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    debug!("{} poller stopped", target.kind);
}
