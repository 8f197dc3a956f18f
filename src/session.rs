//! Peripheral session controller.
//!
//! Owns the sensor service topology, the characteristic value buffers, the
//! parameter store and the connection tracker. The radio stack feeds its
//! callbacks in as [`PeripheralEvent`]s; every event produces a response and
//! none of them can fail back into the stack.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::ble::characteristics::{CharacteristicKind, CharacteristicSurface, ServiceDefinition};
use crate::ble::connection::{ConnectionEvent, ConnectionState, ConnectionTracker};
use crate::ble::transport::PeripheralTransport;
use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::indicator::IndicatorHandle;
use crate::policy::{self, SettingsPolicy, WriteOutcome};
use crate::storage::medium::NonVolatileMedium;
use crate::storage::parameter::ParameterStore;

/// Callback from the radio stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralEvent {
    /// A central connected.
    Connected,
    /// The central disconnected.
    Disconnected,
    /// A central is reading the Settings characteristic.
    SettingsRead,
    /// A central wrote the Settings characteristic.
    SettingsWrite(Bytes),
}

/// What the stack should do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResponse {
    /// Nothing to return.
    Handled,
    /// Value to return to the reading central.
    ReadValue(Bytes),
    /// Outcome of a Settings write; the acknowledgment has been notified.
    WriteAck(WriteOutcome),
}

/// Single entry point for stack callbacks.
pub trait PeripheralEventHandler {
    /// Handle one event. Must return promptly and never fail.
    fn handle(&self, event: PeripheralEvent) -> EventResponse;
}

/// A durable-storage failure reported to supervisors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFault {
    /// Description of the failure.
    pub message: String,
}

/// The peripheral side of the sensor node.
pub struct PeripheralSession<T, M> {
    /// The platform BLE stack.
    transport: T,
    /// Node configuration.
    config: NodeConfig,
    /// Service registered at start.
    service: ServiceDefinition,
    /// Connection lifecycle.
    tracker: ConnectionTracker,
    /// Settings access policy.
    policy: SettingsPolicy,
    /// Persisted parameter, shared with the publish path.
    store: Mutex<ParameterStore<M>>,
    /// Characteristic value buffers.
    surface: Mutex<CharacteristicSurface>,
    /// Channel for storage faults.
    fault_tx: broadcast::Sender<StorageFault>,
    /// Whether the service is registered and advertising started.
    started: AtomicBool,
}

impl<T, M> PeripheralSession<T, M>
where
    T: PeripheralTransport,
    M: NonVolatileMedium,
{
    /// Create a session over a transport and a medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the parameter
    /// cell does not fit the medium.
    pub fn new(
        transport: T,
        medium: M,
        indicator: IndicatorHandle,
        config: NodeConfig,
    ) -> Result<Self> {
        config.validate()?;
        let store = ParameterStore::with_offset(medium, config.parameter_offset)?;
        let (fault_tx, _) = broadcast::channel(16);

        Ok(Self {
            transport,
            service: ServiceDefinition::sensor_service(),
            tracker: ConnectionTracker::new(indicator, config.blink),
            policy: SettingsPolicy::new(config.range_check),
            store: Mutex::new(store),
            surface: Mutex::new(CharacteristicSurface::new()),
            fault_tx,
            started: AtomicBool::new(false),
            config,
        })
    }

    /// Register the sensor service and start advertising.
    ///
    /// Calling it again after a successful start does nothing.
    ///
    /// # Errors
    ///
    /// Bring-up failures from the transport are returned as-is; retrying is
    /// left to the caller.
    pub fn start(&self) -> Result<()> {
        if self.started.load(Ordering::SeqCst) {
            debug!("Session already started");
            return Ok(());
        }

        info!(
            "Starting peripheral '{}' with service {}",
            self.config.advertising.device_name, self.service.uuid
        );

        self.transport.register_service(&self.service)?;
        self.transport.start_advertising(&self.config.advertising)?;
        self.started.store(true, Ordering::SeqCst);

        info!(
            "Advertising {} (parameter = {})",
            self.config.advertising.service_uuid,
            self.parameter()
        );
        Ok(())
    }

    /// Check if the session has been started.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    // === Connection ===

    /// Get the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.tracker.state()
    }

    /// Check if a central is connected.
    pub fn is_connected(&self) -> bool {
        self.tracker.is_connected()
    }

    /// Subscribe to connection events.
    pub fn subscribe_connection(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.tracker.subscribe()
    }

    /// Subscribe to storage faults.
    pub fn subscribe_faults(&self) -> broadcast::Receiver<StorageFault> {
        self.fault_tx.subscribe()
    }

    // === Parameter ===

    /// Get the stored parameter byte.
    pub fn parameter(&self) -> u8 {
        self.store.lock().read()
    }

    /// Get the publish interval: the stored value in seconds, or the
    /// configured fallback while it is out of domain.
    pub fn publish_interval(&self) -> Duration {
        self.store
            .lock()
            .interval()
            .unwrap_or(self.config.fallback_publish_interval)
    }

    /// Run `f` with exclusive access to the parameter store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut ParameterStore<M>) -> R) -> R {
        f(&mut self.store.lock())
    }

    // === Characteristics ===

    /// Get the current outward value of a characteristic.
    pub fn characteristic_value(&self, kind: CharacteristicKind) -> Bytes {
        self.surface.lock().value(kind).to_bytes()
    }

    /// Notify a sensor reading on Temperature or Humidity.
    ///
    /// Skipped while no central is connected. Returns `true` if a
    /// notification was sent.
    ///
    /// # Errors
    ///
    /// Returns an error for the Settings characteristic, for payloads over
    /// the size ceiling, or if the transport fails to notify.
    pub fn publish(&self, kind: CharacteristicKind, payload: &[u8]) -> Result<bool> {
        if kind == CharacteristicKind::Settings {
            return Err(Error::InvalidParameter {
                name: "characteristic".to_string(),
                value: kind.to_string(),
            });
        }

        if !self.is_connected() {
            return Ok(false);
        }

        let mut surface = self.surface.lock();
        policy::notify(&self.transport, kind, surface.value_mut(kind), payload)
    }

    /// Get the service definition.
    pub fn service(&self) -> &ServiceDefinition {
        &self.service
    }

    /// Get the configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // === Event handlers ===

    fn on_connected(&self) {
        self.tracker.on_connect();
    }

    fn on_disconnected(&self) {
        if !self.tracker.on_disconnect() {
            return;
        }

        // The stack stops advertising on connect; resume so centrals can find us again.
        match self.transport.start_advertising(&self.config.advertising) {
            Ok(()) => info!("Advertising resumed"),
            Err(e) => error!("Failed to resume advertising: {}", e),
        }
    }

    fn on_settings_read(&self) -> Bytes {
        let store = self.store.lock();
        let mut surface = self.surface.lock();
        let value = surface.value_mut(CharacteristicKind::Settings);

        if let Err(e) = self.policy.on_read(&store, value) {
            error!("Failed to render settings value: {}", e);
        }
        debug!("Settings read -> {:?}", String::from_utf8_lossy(value.as_bytes()));
        value.to_bytes()
    }

    fn on_settings_write(&self, payload: &[u8]) -> WriteOutcome {
        let (outcome, fault) = {
            let mut store = self.store.lock();
            let mut surface = self.surface.lock();
            self.policy.on_write(
                payload,
                &mut store,
                surface.value_mut(CharacteristicKind::Settings),
                &self.transport,
            )
        };

        match (&outcome, fault) {
            (_, Some(e)) => self.report_fault(e),
            (WriteOutcome::Applied { value, committed }, None) => {
                debug!("Settings write applied: {} (committed: {})", value, committed)
            }
            _ => {}
        }
        outcome
    }

    fn report_fault(&self, e: Error) {
        error!("Parameter store fault: {}", e);
        if self
            .fault_tx
            .send(StorageFault {
                message: e.to_string(),
            })
            .is_err()
        {
            warn!("No supervisor subscribed to storage faults");
        }
    }
}

impl<T, M> PeripheralEventHandler for PeripheralSession<T, M>
where
    T: PeripheralTransport,
    M: NonVolatileMedium,
{
    fn handle(&self, event: PeripheralEvent) -> EventResponse {
        match event {
            PeripheralEvent::Connected => {
                self.on_connected();
                EventResponse::Handled
            }
            PeripheralEvent::Disconnected => {
                self.on_disconnected();
                EventResponse::Handled
            }
            PeripheralEvent::SettingsRead => EventResponse::ReadValue(self.on_settings_read()),
            PeripheralEvent::SettingsWrite(payload) => {
                EventResponse::WriteAck(self.on_settings_write(&payload))
            }
        }
    }
}
