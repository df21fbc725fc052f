//! Single-writer queue in front of the configurator.
//!
//! Applying credentials restarts the wireless client, a process-wide side
//! effect. Every apply request goes through one worker task, so restarts run
//! one at a time in submission order and never block a GATT callback.

use super::configurator::WifiConfigurator;
use super::credentials::WifiCredentials;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound on waiting for queued applies at shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle for submitting credentials to the apply worker.
#[derive(Debug, Clone)]
pub struct ConfiguratorQueue {
    tx: mpsc::UnboundedSender<WifiCredentials>,
}

/// Owner of the apply worker task.
#[derive(Debug)]
pub struct ConfiguratorWorker {
    closing: CancellationToken,
    task: JoinHandle<()>,
}

impl ConfiguratorQueue {
    /// Spawn the worker task.
    ///
    /// The worker exits once it is shut down or every queue handle has been
    /// dropped, in both cases after the backlog is drained.
    pub fn spawn(configurator: Arc<dyn WifiConfigurator>) -> (Self, ConfiguratorWorker) {
        let (tx, mut rx) = mpsc::unbounded_channel::<WifiCredentials>();
        let closing = CancellationToken::new();

        let task = {
            let closing = closing.clone();
            tokio::spawn(async move {
                loop {
                    let next = tokio::select! {
                        biased;
                        next = rx.recv() => Some(next),
                        _ = closing.cancelled() => None,
                    };
                    let next = match next {
                        Some(next) => next,
                        None => {
                            // Refuse new submissions, keep what is buffered
                            rx.close();
                            rx.recv().await
                        }
                    };
                    let Some(credentials) = next else {
                        break;
                    };

                    info!("Applying WiFi credentials for '{}'", credentials.ssid);
                    match configurator.apply_wifi_credentials(&credentials).await {
                        Ok(()) => info!("WiFi credentials applied for '{}'", credentials.ssid),
                        Err(e) => error!(
                            "Failed to apply WiFi credentials for '{}': {}",
                            credentials.ssid, e
                        ),
                    }
                }
                info!("Configurator queue closed");
            })
        };

        (Self { tx }, ConfiguratorWorker { closing, task })
    }

    /// Queue credentials for application. Never blocks.
    ///
    /// Returns false if the worker is gone or shutting down.
    pub fn submit(&self, credentials: WifiCredentials) -> bool {
        if self.tx.send(credentials).is_err() {
            warn!("Configurator worker stopped, dropping credentials");
            return false;
        }
        true
    }
}

impl ConfiguratorWorker {
    /// Stop accepting credentials and wait for queued applies to finish.
    ///
    /// An apply in progress is never interrupted. Returns false if the
    /// backlog did not drain within `timeout`.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        self.closing.cancel();
        match tokio::time::timeout(timeout, self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Configurator worker failed: {}", e);
                false
            }
            Err(_) => {
                warn!(
                    "Configurator still busy after {}s, abandoning pending applies",
                    timeout.as_secs()
                );
                false
            }
        }
    }
}
