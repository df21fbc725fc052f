//! Recording fakes for the collaborator traits.
//!
//! Only compiled for unit tests.

use crate::advertising::Advertisement;
use crate::application::GattApplication;
use crate::characteristic::CommandRunner;
use crate::gatt::ObjectPath;
use crate::host::{AdvertisingManager, GattManager, HostError, NotificationSink};
use crate::poller::{SampleError, StatusKind, SystemStatusProvider};
use crate::wifi::{ApplyError, CredentialError, WifiConfigurator, WifiCredentials};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every apply call.
#[derive(Default)]
pub struct RecordingConfigurator {
    calls: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
    delay: Option<Duration>,
    fail: bool,
}

impl RecordingConfigurator {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// (ssid, password) pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of applies that ran to the end.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WifiConfigurator for RecordingConfigurator {
    async fn apply_wifi_credentials(
        &self,
        credentials: &WifiCredentials,
    ) -> Result<(), ApplyError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls
            .lock()
            .unwrap()
            .push((credentials.ssid.clone(), credentials.password.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ApplyError::InvalidCredentials(CredentialError::SsidEmpty));
        }
        Ok(())
    }
}

/// Records every published value.
#[derive(Default)]
pub struct RecordingSink {
    values: Mutex<Vec<(ObjectPath, Vec<u8>)>>,
}

impl RecordingSink {
    pub fn values(&self) -> Vec<(ObjectPath, Vec<u8>)> {
        self.values.lock().unwrap().clone()
    }

    pub fn values_for(&self, path: &ObjectPath) -> Vec<Vec<u8>> {
        self.values()
            .into_iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v)
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn value_changed(&self, path: &ObjectPath, value: Vec<u8>) {
        self.values.lock().unwrap().push((path.clone(), value));
    }
}

enum Script {
    Constant(String),
    FailFirst(usize, String),
    Hang,
}

/// Status provider with scripted results.
pub struct ScriptedStatusProvider {
    script: Script,
    samples: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
}

/// Counts a sample as live until dropped.
struct LiveSample<'a>(&'a AtomicUsize);

impl Drop for LiveSample<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedStatusProvider {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            samples: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
            max_live: AtomicUsize::new(0),
        }
    }

    pub fn constant(value: &str) -> Self {
        Self::with_script(Script::Constant(value.to_string()))
    }

    /// Fail the first `failures` samples, then return `value`.
    pub fn failing_first(failures: usize, value: &str) -> Self {
        Self::with_script(Script::FailFirst(failures, value.to_string()))
    }

    /// Never complete a sample.
    pub fn hanging() -> Self {
        Self::with_script(Script::Hang)
    }

    /// Number of samples started.
    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }

    /// Samples currently in progress.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Most samples ever in progress at once.
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SystemStatusProvider for ScriptedStatusProvider {
    async fn sample(&self, kind: StatusKind) -> Result<String, SampleError> {
        let index = self.samples.fetch_add(1, Ordering::SeqCst);
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now, Ordering::SeqCst);
        let _live = LiveSample(&self.live);
        match &self.script {
            Script::Constant(value) => Ok(value.clone()),
            Script::FailFirst(failures, _) if index < *failures => Err(SampleError::NoMatch(kind)),
            Script::FailFirst(_, value) => Ok(value.clone()),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Command runner that echoes the command back.
#[derive(Default)]
pub struct EchoCommandRunner {
    commands: Mutex<Vec<String>>,
}

impl EchoCommandRunner {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for EchoCommandRunner {
    async fn run(&self, command: &str) -> std::io::Result<Vec<u8>> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(format!("ran: {}", command).into_bytes())
    }
}

/// Advertising manager that counts registrations.
#[derive(Default)]
pub struct FakeAdvertisingManager {
    registered: AtomicUsize,
    unregistered: AtomicUsize,
    fail_register: bool,
    unregister_delay: Option<Duration>,
}

impl FakeAdvertisingManager {
    pub fn failing() -> Self {
        Self {
            fail_register: true,
            ..Default::default()
        }
    }

    pub fn with_unregister_delay(delay: Duration) -> Self {
        Self {
            unregister_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn unregistered(&self) -> usize {
        self.unregistered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdvertisingManager for FakeAdvertisingManager {
    type Handle = usize;

    async fn register_advertisement(
        &self,
        _advertisement: &Advertisement,
    ) -> Result<usize, HostError> {
        if self.fail_register {
            return Err(HostError::Registration("rejected".into()));
        }
        Ok(self.registered.fetch_add(1, Ordering::SeqCst))
    }

    async fn unregister_advertisement(&self, _handle: usize) -> Result<(), HostError> {
        if let Some(delay) = self.unregister_delay {
            tokio::time::sleep(delay).await;
        }
        self.unregistered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// GATT manager that counts registrations.
#[derive(Default)]
pub struct RecordingGattManager {
    registrations: AtomicUsize,
    fail: bool,
}

impl RecordingGattManager {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GattManager for RecordingGattManager {
    async fn register_application(
        &self,
        _application: Arc<GattApplication>,
    ) -> Result<(), HostError> {
        if self.fail {
            return Err(HostError::Registration("rejected".into()));
        }
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
