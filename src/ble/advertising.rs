//! Advertising configuration.
//!
//! The node advertises one service UUID under a fixed device name.
//! Peripherals stop advertising once a central connects, so the session
//! re-arms it with the same configuration after every disconnect.

use uuid::Uuid;

use crate::ble::uuids::{ADVERTISING_UUID, DEVICE_NAME};
use crate::error::{Error, Result};

/// Longest name that fits a legacy advertising payload (31 bytes minus
/// the AD length/type header).
pub const MAX_DEVICE_NAME_LEN: usize = 29;

/// Parameters for the advertising set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvertisingConfig {
    /// Complete local name.
    pub device_name: String,
    /// The single advertised service UUID.
    pub service_uuid: Uuid,
    /// Whether to answer scan requests.
    pub scan_response: bool,
    /// Minimum preferred connection interval hint (0x00 = no preference).
    pub min_preferred_interval: u16,
}

impl Default for AdvertisingConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            service_uuid: ADVERTISING_UUID,
            scan_response: false,
            min_preferred_interval: 0x00,
        }
    }
}

impl AdvertisingConfig {
    /// Use a different device name.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Check the configuration fits in an advertising payload.
    pub fn validate(&self) -> Result<()> {
        if self.device_name.is_empty() || self.device_name.len() > MAX_DEVICE_NAME_LEN {
            return Err(Error::InvalidParameter {
                name: "device_name".to_string(),
                value: self.device_name.clone(),
            });
        }
        Ok(())
    }
}
