//! BLE peripheral module.
//!
//! This module contains the peripheral-side building blocks:
//! - Advertising configuration
//! - Characteristic definitions and value buffers
//! - Connection lifecycle tracking
//! - The radio stack seam
//! - UUIDs

pub mod advertising;
pub mod characteristics;
pub mod connection;
pub mod transport;
pub mod uuids;

pub use advertising::AdvertisingConfig;
pub use characteristics::{
    CharacteristicKind, CharacteristicProperties, CharacteristicSurface, CharacteristicValue,
    ServiceDefinition, MAX_PAYLOAD_LEN,
};
pub use connection::{ConnectionEvent, ConnectionState, ConnectionTracker};
pub use transport::PeripheralTransport;
