// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # simple-ble-node
//!
//! Peripheral-side core of a battery-powered temperature/humidity sensor
//! node that talks Bluetooth Low Energy.
//!
//! The node advertises a single service with three characteristics:
//!
//! | Characteristic | Properties          | Payload                              |
//! |----------------|---------------------|--------------------------------------|
//! | Temperature    | notify              | ASCII decimal, e.g. `"21.5"`         |
//! | Humidity       | notify              | ASCII decimal, e.g. `"48.0"`         |
//! | Settings       | notify, write, read | interval in seconds, `1`..=`10`      |
//!
//! Writes to Settings are validated, persisted to non-volatile storage and
//! acknowledged with `"true"` or `"false"`.
//!
//! ## Features
//!
//! - **Session controller**: registers the service, advertises, re-arms
//!   advertising after a central leaves
//! - **Event dispatch**: stack callbacks arrive as [`PeripheralEvent`]s through
//!   one [`PeripheralEventHandler`]
//! - **Persisted parameter**: change-suppressed durable writes over any
//!   [`NonVolatileMedium`]
//! - **Non-blocking indicator**: connect/disconnect blinks run on their own task
//! - **Publisher**: periodic sensor notifications paced by the stored interval
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use simple_ble_node::{
//!     AdvertisingConfig, IndicatorHandle, MemoryMedium, NodeConfig, PeripheralEvent,
//!     PeripheralEventHandler, PeripheralSession, PeripheralTransport, Result,
//!     ServiceDefinition,
//! };
//! use uuid::Uuid;
//!
//! struct Stack;
//!
//! impl PeripheralTransport for Stack {
//!     fn register_service(&self, _service: &ServiceDefinition) -> Result<()> { Ok(()) }
//!     fn start_advertising(&self, _config: &AdvertisingConfig) -> Result<()> { Ok(()) }
//!     fn notify(&self, _uuid: Uuid, _payload: &[u8]) -> Result<()> { Ok(()) }
//! }
//!
//! fn main() -> Result<()> {
//!     let session = PeripheralSession::new(
//!         Stack,
//!         MemoryMedium::new(16),
//!         IndicatorHandle::disabled(),
//!         NodeConfig::default(),
//!     )?;
//!     session.start()?;
//!
//!     session.handle(PeripheralEvent::Connected);
//!     session.handle(PeripheralEvent::SettingsWrite(Bytes::from_static(b"5")));
//!     assert_eq!(session.parameter(), 5);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for configuration and data types

// Public modules
pub mod ble;
pub mod config;
pub mod error;
pub mod indicator;
pub mod policy;
pub mod publisher;
pub mod session;
pub mod storage;

// Re-exports for convenience
pub use config::NodeConfig;
pub use error::{Error, Result};
pub use session::{
    EventResponse, PeripheralEvent, PeripheralEventHandler, PeripheralSession, StorageFault,
};

// Re-export commonly used types from submodules
pub use ble::{
    AdvertisingConfig, CharacteristicKind, ConnectionEvent, ConnectionState, PeripheralTransport,
    ServiceDefinition,
};
pub use indicator::{spawn_indicator, BlinkPattern, IndicatorHandle, Lamp};
pub use policy::{RangeCheck, SettingsPolicy, WriteOutcome};
pub use publisher::{run_publisher, PublishStats, SensorReading, SensorSource};
pub use storage::{FileMedium, MemoryMedium, NonVolatileMedium, ParameterStore};
