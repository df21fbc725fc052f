//! BlueZ host stack over D-Bus, via `bluer`.
//!
//! The object tree is mirrored into a `bluer` application. Every callback
//! dispatches to [`GattApplication`] by object path; `bluer` owns the D-Bus
//! object export and `GetManagedObjects`.

use super::{AdvertisingManager, GattManager, HostError, NotificationSink};
use crate::advertising::{Advertisement, AdvertisementType};
use crate::application::GattApplication;
use crate::characteristic::Options;
use crate::gatt::{Capabilities, CharacteristicNode, DescriptorNode, GattError, ObjectPath};
use async_trait::async_trait;
use bluer::adv::{AdvertisementHandle, Feature, Type};
use bluer::gatt::local::{
    Application, ApplicationHandle, Characteristic, CharacteristicNotifier, CharacteristicNotify,
    CharacteristicNotifyMethod, CharacteristicRead, CharacteristicReadRequest,
    CharacteristicWrite, CharacteristicWriteMethod, CharacteristicWriteRequest, Descriptor,
    DescriptorRead, DescriptorReadRequest, ReqError, Service,
};
use bluer::{Adapter, Session};
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Routes notification values to live `bluer` notify sessions.
#[derive(Default)]
pub struct BluezSink {
    subscribers: Mutex<HashMap<ObjectPath, mpsc::UnboundedSender<Vec<u8>>>>,
}

impl BluezSink {
    fn subscribe(&self, path: &ObjectPath) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(path.clone(), tx);
        rx
    }

    fn unsubscribe(&self, path: &ObjectPath) {
        self.lock().remove(path);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ObjectPath, mpsc::UnboundedSender<Vec<u8>>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NotificationSink for BluezSink {
    fn value_changed(&self, path: &ObjectPath, value: Vec<u8>) {
        match self.lock().get(path) {
            Some(tx) => {
                let _ = tx.send(value);
            }
            None => debug!("No notify session for {}", path),
        }
    }
}

/// BlueZ adapter handle implementing both registration traits.
pub struct BluezHost {
    _session: Session,
    adapter: Adapter,
    sink: Arc<BluezSink>,
    application: tokio::sync::Mutex<Option<ApplicationHandle>>,
}

impl BluezHost {
    /// Connect to BlueZ and power on the default adapter.
    pub async fn connect() -> Result<Self, HostError> {
        let session = Session::new().await.map_err(transport)?;
        let adapter = session
            .default_adapter()
            .await
            .map_err(|_| HostError::NoAdapter)?;

        if !adapter.is_powered().await.map_err(transport)? {
            info!("Powering on Bluetooth adapter {}", adapter.name());
            adapter.set_powered(true).await.map_err(transport)?;
        }
        info!("Using Bluetooth adapter {}", adapter.name());

        Ok(Self {
            _session: session,
            adapter,
            sink: Arc::new(BluezSink::default()),
            application: tokio::sync::Mutex::new(None),
        })
    }

    /// Sink to hand to the characteristic collaborators.
    pub fn sink(&self) -> Arc<BluezSink> {
        self.sink.clone()
    }
}

#[async_trait]
impl GattManager for BluezHost {
    async fn register_application(
        &self,
        application: Arc<GattApplication>,
    ) -> Result<(), HostError> {
        let app = to_bluer_application(&application, &self.sink);
        let handle = self
            .adapter
            .serve_gatt_application(app)
            .await
            .map_err(|e| HostError::Registration(e.to_string()))?;
        *self.application.lock().await = Some(handle);
        info!("GATT application registered");
        Ok(())
    }
}

#[async_trait]
impl AdvertisingManager for BluezHost {
    type Handle = AdvertisementHandle;

    async fn register_advertisement(
        &self,
        advertisement: &Advertisement,
    ) -> Result<AdvertisementHandle, HostError> {
        let mut system_includes = BTreeSet::new();
        if advertisement.include_tx_power {
            system_includes.insert(Feature::TxPower);
        }

        let le_advertisement = bluer::adv::Advertisement {
            advertisement_type: match advertisement.advertisement_type {
                AdvertisementType::Broadcast => Type::Broadcast,
                AdvertisementType::Peripheral => Type::Peripheral,
            },
            service_uuids: advertisement.service_uuids.iter().copied().collect(),
            local_name: Some(advertisement.local_name.clone()),
            system_includes,
            ..Default::default()
        };

        self.adapter
            .advertise(le_advertisement)
            .await
            .map_err(|e| HostError::Registration(e.to_string()))
    }

    async fn unregister_advertisement(&self, handle: AdvertisementHandle) -> Result<(), HostError> {
        // bluer unregisters when the handle drops
        drop(handle);
        Ok(())
    }
}

fn transport(e: bluer::Error) -> HostError {
    HostError::Transport(e.to_string())
}

fn req_error(e: GattError) -> ReqError {
    debug!("Rejecting request: {} ({})", e, e.dbus_name());
    match e {
        GattError::NotSupported => ReqError::NotSupported,
        GattError::NotPermitted => ReqError::NotPermitted,
        GattError::InvalidArgs(_) | GattError::Failed(_) => ReqError::Failed,
    }
}

fn read_options(req: &CharacteristicReadRequest) -> Options {
    let mut options = Options::new();
    options.insert("offset".into(), req.offset.to_string());
    options.insert("mtu".into(), req.mtu.to_string());
    options.insert("device".into(), req.device_address.to_string());
    options
}

fn write_options(req: &CharacteristicWriteRequest) -> Options {
    let mut options = Options::new();
    options.insert("offset".into(), req.offset.to_string());
    options.insert("mtu".into(), req.mtu.to_string());
    options.insert("device".into(), req.device_address.to_string());
    options
}

fn to_bluer_application(application: &Arc<GattApplication>, sink: &Arc<BluezSink>) -> Application {
    let services = application
        .tree()
        .services()
        .iter()
        .map(|service| Service {
            uuid: service.uuid,
            primary: service.primary,
            characteristics: service
                .characteristics
                .iter()
                .map(|node| to_bluer_characteristic(node, application, sink))
                .collect(),
            ..Default::default()
        })
        .collect();

    Application {
        services,
        ..Default::default()
    }
}

fn to_bluer_characteristic(
    node: &CharacteristicNode,
    application: &Arc<GattApplication>,
    sink: &Arc<BluezSink>,
) -> Characteristic {
    let capabilities = node.capabilities();

    let read = capabilities.contains(Capabilities::READ).then(|| {
        let app = application.clone();
        let path = node.path.clone();
        CharacteristicRead {
            read: true,
            fun: Box::new(move |req: CharacteristicReadRequest| {
                let result = app.read_value(&path, &read_options(&req)).map_err(req_error);
                Box::pin(async move { result })
            }),
            ..Default::default()
        }
    });

    let write = capabilities.can_write().then(|| {
        let app = application.clone();
        let path = node.path.clone();
        CharacteristicWrite {
            write: capabilities.contains(Capabilities::WRITE),
            write_without_response: capabilities.contains(Capabilities::WRITE_WITHOUT_RESPONSE),
            method: CharacteristicWriteMethod::Fun(Box::new(
                move |value: Vec<u8>, req: CharacteristicWriteRequest| {
                    let result = app
                        .write_value(&path, &value, &write_options(&req))
                        .map_err(req_error);
                    Box::pin(async move { result })
                },
            )),
            ..Default::default()
        }
    });

    let notify = capabilities.contains(Capabilities::NOTIFY).then(|| {
        let app = application.clone();
        let sink = sink.clone();
        let path = node.path.clone();
        CharacteristicNotify {
            notify: true,
            method: CharacteristicNotifyMethod::Fun(Box::new(move |notifier| {
                let app = app.clone();
                let sink = sink.clone();
                let path = path.clone();
                Box::pin(async move { notify_session(app, sink, path, notifier).await })
            })),
            ..Default::default()
        }
    });

    Characteristic {
        uuid: node.uuid(),
        read,
        write,
        notify,
        descriptors: node
            .descriptors
            .iter()
            .map(|desc| to_bluer_descriptor(desc, application))
            .collect(),
        ..Default::default()
    }
}

fn to_bluer_descriptor(node: &DescriptorNode, application: &Arc<GattApplication>) -> Descriptor {
    let app = application.clone();
    let path = node.path.clone();
    Descriptor {
        uuid: node.spec.uuid,
        read: Some(DescriptorRead {
            read: true,
            fun: Box::new(move |_req: DescriptorReadRequest| {
                let result = app.read_value(&path, &Options::new()).map_err(req_error);
                Box::pin(async move { result })
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// One BlueZ notify session: StartNotify on entry, StopNotify on exit.
async fn notify_session(
    app: Arc<GattApplication>,
    sink: Arc<BluezSink>,
    path: ObjectPath,
    mut notifier: CharacteristicNotifier,
) {
    let mut values = sink.subscribe(&path);
    if let Err(e) = app.start_notify(&path).await {
        warn!("StartNotify on {} failed: {}", path, e);
        sink.unsubscribe(&path);
        return;
    }
    debug!("Notify session started on {}", path);

    loop {
        tokio::select! {
            _ = notifier.stopped() => break,
            value = values.recv() => match value {
                Some(value) => {
                    if let Err(e) = notifier.notify(value).await {
                        debug!("Notify on {} failed: {}", path, e);
                        break;
                    }
                }
                None => break,
            },
        }
    }

    sink.unsubscribe(&path);
    if let Err(e) = app.stop_notify(&path).await {
        warn!("StopNotify on {} failed: {}", path, e);
    }
    debug!("Notify session ended on {}", path);
}
