//! Radio stack seam.
//!
//! The GATT server and advertiser are provided by the platform's BLE stack.
//! The session drives it through [`PeripheralTransport`] and receives its
//! callbacks as [`PeripheralEvent`](crate::session::PeripheralEvent)s.

use uuid::Uuid;

use crate::ble::advertising::AdvertisingConfig;
use crate::ble::characteristics::ServiceDefinition;
use crate::error::Result;

/// Operations the core needs from the platform's BLE stack.
///
/// Implementations are called from the stack's callback context as well as
/// from the publish task, so they must be shareable across threads.
#[cfg_attr(test, mockall::automock)]
pub trait PeripheralTransport: Send + Sync {
    /// Create the GATT service with its characteristics and descriptors, and start it.
    fn register_service(&self, service: &ServiceDefinition) -> Result<()>;

    /// Start (or restart) advertising.
    fn start_advertising(&self, config: &AdvertisingConfig) -> Result<()>;

    /// Push `payload` to every central subscribed to `characteristic`.
    fn notify(&self, characteristic: Uuid, payload: &[u8]) -> Result<()>;
}
