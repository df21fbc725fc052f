//! Application context: wires the collaborators and runs the peripheral.
//!
//! ```text
//! register GATT application ─► register advertisement ─► spawn auto-stop timer
//!                                                              │
//! shutdown signal ─► stop advertising (once) ─► stop pollers ◄─┘
//!                                                     │
//!                                   drain pending WiFi applies
//! ```
//!
//! Host registration failures are fatal and end [`AppContext::run`] with an
//! error. Timer expiry only stops advertising; the process keeps serving
//! until shutdown.

use crate::advertising::{Advertisement, AdvertisingLifecycle, LifecycleError};
use crate::application::GattApplication;
use crate::characteristic::{load_device_model, Collaborators, CommandRunner, ShellCommandRunner};
use crate::config::ServiceConfig;
use crate::gatt::{ObjectTree, SERVICE_UUID};
use crate::host::{AdvertisingManager, GattManager, HostError, NotificationSink};
use crate::poller::{LinuxStatusProvider, SystemStatusProvider};
use crate::wifi::{
    ConfiguratorQueue, ConfiguratorWorker, WifiConfigurator, WpaSupplicantConfigurator,
    DRAIN_TIMEOUT,
};
use log::{info, warn};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Fatal startup errors.
#[derive(Debug)]
pub enum StartupError {
    /// GATT application registration failed.
    Gatt(HostError),
    /// Advertisement registration failed.
    Advertising(LifecycleError),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gatt(e) => write!(f, "failed to register GATT application: {}", e),
            Self::Advertising(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gatt(e) => Some(e),
            Self::Advertising(e) => Some(e),
        }
    }
}

/// Build the GATT application for `config` with the Linux collaborators.
///
/// Returns the application and the configurator worker that
/// [`AppContext`] drains on shutdown.
pub fn build_application(
    config: &ServiceConfig,
    sink: Arc<dyn NotificationSink>,
) -> (Arc<GattApplication>, ConfiguratorWorker) {
    let configurator: Arc<dyn WifiConfigurator> = Arc::new(WpaSupplicantConfigurator::new(
        config.interface.clone(),
        config.wpa_config.clone(),
    ));
    let status: Arc<dyn SystemStatusProvider> =
        Arc::new(LinuxStatusProvider::new(config.interface.clone()));
    let command_runner: Option<Arc<dyn CommandRunner>> = if config.enable_command_execution {
        warn!("Command execution enabled: any BLE peer can run shell commands");
        Some(Arc::new(ShellCommandRunner))
    } else {
        None
    };

    let (queue, worker) = ConfiguratorQueue::spawn(configurator);
    let collaborators = Collaborators {
        device_model: load_device_model(&config.device_model_path),
        status,
        sink,
        configurator: queue,
        command_runner,
    };

    (
        Arc::new(GattApplication::new(ObjectTree::wifi_config(), collaborators)),
        worker,
    )
}

/// Everything the running peripheral needs, passed explicitly.
pub struct AppContext<G: GattManager, A: AdvertisingManager> {
    config: ServiceConfig,
    gatt: Arc<G>,
    application: Arc<GattApplication>,
    lifecycle: Arc<AdvertisingLifecycle<A>>,
    configurator: Mutex<Option<ConfiguratorWorker>>,
    shutdown: CancellationToken,
}

impl<G: GattManager, A: AdvertisingManager> AppContext<G, A> {
    pub fn new(
        config: ServiceConfig,
        gatt: Arc<G>,
        advertising: Arc<A>,
        application: Arc<GattApplication>,
        configurator: ConfiguratorWorker,
        shutdown: CancellationToken,
    ) -> Self {
        let advertisement =
            Advertisement::peripheral(0, vec![SERVICE_UUID], config.local_name.clone());
        Self {
            config,
            gatt,
            application,
            lifecycle: Arc::new(AdvertisingLifecycle::new(advertising, advertisement)),
            configurator: Mutex::new(Some(configurator)),
            shutdown,
        }
    }

    pub fn lifecycle(&self) -> &Arc<AdvertisingLifecycle<A>> {
        &self.lifecycle
    }

    pub fn application(&self) -> &Arc<GattApplication> {
        &self.application
    }

    /// Token that ends [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register, advertise, and serve until shutdown.
    pub async fn run(&self) -> Result<(), StartupError> {
        self.gatt
            .register_application(self.application.clone())
            .await
            .map_err(StartupError::Gatt)?;
        info!("GATT application registered");

        self.lifecycle
            .register()
            .await
            .map_err(StartupError::Advertising)?;

        let timer = self
            .lifecycle
            .spawn_timer(self.config.advertising_duration(), self.shutdown.clone());

        self.shutdown.cancelled().await;
        info!("Shutting down");

        self.lifecycle.stop().await;
        if let Some(timer) = timer {
            let _ = timer.await;
        }
        self.lifecycle.wait_released().await;
        self.application.shutdown().await;

        // A supplicant restart must not be cut short by process exit
        let worker = self.configurator.lock().await.take();
        if let Some(worker) = worker {
            worker.shutdown(DRAIN_TIMEOUT).await;
        }

        info!("Shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advertising::AdvertisementState;
    use crate::characteristic::Collaborators;
    use crate::testing::{
        FakeAdvertisingManager, RecordingConfigurator, RecordingGattManager, RecordingSink,
        ScriptedStatusProvider,
    };
    use std::time::Duration;

    fn application(
        configurator: Arc<RecordingConfigurator>,
    ) -> (Arc<GattApplication>, ConfiguratorWorker) {
        let (queue, worker) = ConfiguratorQueue::spawn(configurator);
        let application = GattApplication::new(
            ObjectTree::wifi_config(),
            Collaborators {
                device_model: String::new(),
                status: Arc::new(ScriptedStatusProvider::constant("HomeNetwork")),
                sink: Arc::new(RecordingSink::default()),
                configurator: queue,
                command_runner: None,
            },
        );
        (Arc::new(application), worker)
    }

    fn context(
        secs: i64,
        gatt: RecordingGattManager,
        advertising: FakeAdvertisingManager,
    ) -> (
        Arc<AppContext<RecordingGattManager, FakeAdvertisingManager>>,
        Arc<RecordingGattManager>,
        Arc<FakeAdvertisingManager>,
    ) {
        context_with(secs, gatt, advertising, Arc::new(RecordingConfigurator::default()))
    }

    fn context_with(
        secs: i64,
        gatt: RecordingGattManager,
        advertising: FakeAdvertisingManager,
        configurator: Arc<RecordingConfigurator>,
    ) -> (
        Arc<AppContext<RecordingGattManager, FakeAdvertisingManager>>,
        Arc<RecordingGattManager>,
        Arc<FakeAdvertisingManager>,
    ) {
        let gatt = Arc::new(gatt);
        let advertising = Arc::new(advertising);
        let config = ServiceConfig {
            advertising_secs: secs,
            ..Default::default()
        };
        let (application, worker) = application(configurator);
        let ctx = AppContext::new(
            config,
            gatt.clone(),
            advertising.clone(),
            application,
            worker,
            CancellationToken::new(),
        );
        (Arc::new(ctx), gatt, advertising)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_stops_advertising_but_keeps_running() {
        let (ctx, gatt, advertising) =
            context(2, RecordingGattManager::default(), FakeAdvertisingManager::default());

        let run = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.run().await })
        };

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(gatt.registrations(), 1);
        assert_eq!(advertising.unregistered(), 1);
        assert_eq!(ctx.lifecycle().state(), AdvertisementState::Released);
        assert!(!run.is_finished());

        ctx.shutdown_token().cancel();
        assert!(run.await.unwrap().is_ok());
        assert_eq!(advertising.unregistered(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_unregisters_once() {
        let (ctx, _, advertising) =
            context(300, RecordingGattManager::default(), FakeAdvertisingManager::default());

        let run = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.run().await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ctx.lifecycle().state(), AdvertisementState::Advertising);

        ctx.shutdown_token().cancel();
        assert!(run.await.unwrap().is_ok());
        assert_eq!(advertising.registered(), 1);
        assert_eq!(advertising.unregistered(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_racing_timer_unregisters_once() {
        let (ctx, _, advertising) = context(
            2,
            RecordingGattManager::default(),
            FakeAdvertisingManager::with_unregister_delay(Duration::from_millis(100)),
        );

        let run = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.run().await })
        };

        // Signal lands while the timer is unregistering
        tokio::time::sleep(Duration::from_millis(2050)).await;
        ctx.shutdown_token().cancel();

        assert!(run.await.unwrap().is_ok());
        assert_eq!(advertising.unregistered(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_pending_applies() {
        let configurator = Arc::new(RecordingConfigurator::with_delay(Duration::from_secs(5)));
        let (ctx, _, _) = context_with(
            300,
            RecordingGattManager::default(),
            FakeAdvertisingManager::default(),
            configurator.clone(),
        );

        let run = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.run().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let input = ctx
            .application()
            .handler_by_uuid(crate::gatt::CREDENTIAL_INPUT_UUID)
            .unwrap()
            .path()
            .clone();
        let options = Default::default();
        for ssid in ["HomeNetwork", "Office"] {
            let payload = format!("key%&%{}%&%password123", ssid);
            ctx.application()
                .write_value(&input, payload.as_bytes(), &options)
                .unwrap();
        }

        // First apply is mid-restart, second still queued
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(configurator.calls().len(), 1);
        ctx.shutdown_token().cancel();

        assert!(run.await.unwrap().is_ok());
        assert_eq!(configurator.completed(), 2);
    }

    #[tokio::test]
    async fn test_gatt_registration_failure_is_fatal() {
        let (ctx, _, advertising) =
            context(300, RecordingGattManager::failing(), FakeAdvertisingManager::default());

        assert!(matches!(ctx.run().await, Err(StartupError::Gatt(_))));
        assert_eq!(advertising.registered(), 0);
    }

    #[tokio::test]
    async fn test_advertising_registration_failure_is_fatal() {
        let (ctx, _, _) =
            context(300, RecordingGattManager::default(), FakeAdvertisingManager::failing());

        assert!(matches!(
            ctx.run().await,
            Err(StartupError::Advertising(LifecycleError::Host(_)))
        ));
    }

    #[tokio::test]
    async fn test_build_application_defaults() {
        let config = ServiceConfig {
            device_model_path: "/nonexistent/model".into(),
            ..Default::default()
        };
        let (app, _worker) = build_application(&config, Arc::new(RecordingSink::default()));

        let command = app
            .handler_by_uuid(crate::gatt::COMMAND_UUID)
            .unwrap()
            .path()
            .clone();
        assert_eq!(
            app.write_value(&command, b"id", &Default::default()),
            Err(crate::gatt::GattError::NotPermitted)
        );
    }
}
