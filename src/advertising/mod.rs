//! Advertising registration and timed auto-stop.
//!
//! # State Machine
//!
//! ```text
//! Idle ──register()──► Registering ──ok──► Advertising ──stop()──► Unregistering ──► Released
//!   │                       └──err──────────────────────────────────────────────────► Released
//!   └──stop()────────────────────────────────────────────────────────────────────────► Released
//! ```
//!
//! The auto-stop timer and the shutdown signal both call [`AdvertisingLifecycle::stop`].
//! The `Advertising → Unregistering` transition is claimed atomically, so
//! exactly one caller unregisters and the other sees
//! [`StopOutcome::AlreadyStopped`].

mod advertisement;

pub use advertisement::{Advertisement, AdvertisementType, LE_ADVERTISEMENT_IFACE};

use crate::host::{AdvertisingManager, HostError};
use log::{debug, error, info};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default advertising period in seconds.
pub const DEFAULT_ADVERTISING_SECS: i64 = 300;

/// Advertising period from a signed seconds value; `None` (≤ 0) means never stop.
pub fn advertising_duration(secs: i64) -> Option<Duration> {
    u64::try_from(secs)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Lifecycle state of the advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisementState {
    Idle,
    Registering,
    Advertising,
    Unregistering,
    Released,
}

impl fmt::Display for AdvertisementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Registering => "registering",
            Self::Advertising => "advertising",
            Self::Unregistering => "unregistering",
            Self::Released => "released",
        };
        f.write_str(name)
    }
}

/// Result of a [`AdvertisingLifecycle::stop`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// This call performed the unregistration.
    Unregistered,
    /// Another caller already stopped advertising.
    AlreadyStopped,
    /// Advertising was never registered.
    NotRegistered,
}

/// Lifecycle errors.
#[derive(Debug)]
pub enum LifecycleError {
    /// `register` called outside the `Idle` state.
    InvalidState(AdvertisementState),
    /// The host stack rejected the advertisement.
    Host(HostError),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState(state) => write!(f, "cannot register while {}", state),
            Self::Host(e) => write!(f, "advertisement registration failed: {}", e),
        }
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Host(e) => Some(e),
            Self::InvalidState(_) => None,
        }
    }
}

/// Owns the advertisement registration and its state.
pub struct AdvertisingLifecycle<M: AdvertisingManager> {
    manager: Arc<M>,
    advertisement: Advertisement,
    state: watch::Sender<AdvertisementState>,
    handle: Mutex<Option<M::Handle>>,
}

impl<M: AdvertisingManager> AdvertisingLifecycle<M> {
    pub fn new(manager: Arc<M>, advertisement: Advertisement) -> Self {
        let (state, _) = watch::channel(AdvertisementState::Idle);
        Self {
            manager,
            advertisement,
            state,
            handle: Mutex::new(None),
        }
    }

    pub fn advertisement(&self) -> &Advertisement {
        &self.advertisement
    }

    pub fn state(&self) -> AdvertisementState {
        *self.state.borrow()
    }

    /// Register the advertisement with the host stack.
    pub async fn register(&self) -> Result<(), LifecycleError> {
        let mut previous = AdvertisementState::Idle;
        let claimed = self.state.send_if_modified(|state| {
            previous = *state;
            if *state == AdvertisementState::Idle {
                *state = AdvertisementState::Registering;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(LifecycleError::InvalidState(previous));
        }

        match self
            .manager
            .register_advertisement(&self.advertisement)
            .await
        {
            Ok(handle) => {
                *self.lock_handle() = Some(handle);
                self.state.send_replace(AdvertisementState::Advertising);
                info!(
                    "Advertising '{}' at {}",
                    self.advertisement.local_name, self.advertisement.path
                );
                Ok(())
            }
            Err(e) => {
                self.state.send_replace(AdvertisementState::Released);
                Err(LifecycleError::Host(e))
            }
        }
    }

    /// Stop advertising. Safe to call from any number of tasks.
    pub async fn stop(&self) -> StopOutcome {
        // Let an in-flight registration settle first
        let mut rx = self.state.subscribe();
        let _ = rx
            .wait_for(|state| *state != AdvertisementState::Registering)
            .await;

        let mut previous = AdvertisementState::Idle;
        self.state.send_if_modified(|state| {
            previous = *state;
            match *state {
                AdvertisementState::Advertising => {
                    *state = AdvertisementState::Unregistering;
                    true
                }
                AdvertisementState::Idle => {
                    *state = AdvertisementState::Released;
                    true
                }
                _ => false,
            }
        });

        match previous {
            AdvertisementState::Advertising => {
                let handle = self.lock_handle().take();
                if let Some(handle) = handle {
                    match self.manager.unregister_advertisement(handle).await {
                        Ok(()) => info!("Advertisement unregistered"),
                        Err(e) => error!("Failed to unregister advertisement: {}", e),
                    }
                }
                self.state.send_replace(AdvertisementState::Released);
                StopOutcome::Unregistered
            }
            AdvertisementState::Idle => StopOutcome::NotRegistered,
            _ => {
                debug!("Advertising already {}", previous);
                StopOutcome::AlreadyStopped
            }
        }
    }

    /// Wait until the advertisement reaches `Released`.
    pub async fn wait_released(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx
            .wait_for(|state| *state == AdvertisementState::Released)
            .await;
    }

    /// Spawn the auto-stop timer. Returns `None` when `duration` is `None`.
    ///
    /// The timer gives up without unregistering if `shutdown` fires first.
    pub fn spawn_timer(
        self: &Arc<Self>,
        duration: Option<Duration>,
        shutdown: CancellationToken,
    ) -> Option<JoinHandle<StopOutcome>> {
        let Some(duration) = duration else {
            info!("Advertising indefinitely");
            return None;
        };

        let lifecycle = Arc::clone(self);
        Some(tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => StopOutcome::AlreadyStopped,
                _ = tokio::time::sleep(duration) => {
                    info!("Advertising period of {}s elapsed", duration.as_secs());
                    lifecycle.stop().await
                }
            }
        }))
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<M::Handle>> {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
