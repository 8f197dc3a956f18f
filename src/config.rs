//! Node configuration.
//!
//! Collects the fixed identity and tunables of the node in one place. The
//! defaults reproduce the deployed firmware.

use std::time::Duration;

use crate::ble::advertising::AdvertisingConfig;
use crate::error::Result;
use crate::indicator::BlinkPattern;
use crate::policy::RangeCheck;
use crate::storage::parameter::PARAMETER_OFFSET;

/// Configuration for a [`PeripheralSession`](crate::session::PeripheralSession).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeConfig {
    /// Advertising set parameters.
    pub advertising: AdvertisingConfig,
    /// How Settings writes are checked against the interval domain.
    pub range_check: RangeCheck,
    /// Offset of the parameter cell on the medium.
    pub parameter_offset: usize,
    /// Pattern blinked on connect and disconnect.
    pub blink: BlinkPattern,
    /// Publish interval used while the stored parameter is out of domain.
    pub fallback_publish_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            advertising: AdvertisingConfig::default(),
            range_check: RangeCheck::default(),
            parameter_offset: PARAMETER_OFFSET,
            blink: BlinkPattern::default(),
            fallback_publish_interval: Self::DEFAULT_FALLBACK_INTERVAL,
        }
    }
}

impl NodeConfig {
    /// Default fallback publish interval (1 second).
    pub const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::from_secs(1);

    /// Set the advertising parameters.
    pub fn with_advertising(mut self, advertising: AdvertisingConfig) -> Self {
        self.advertising = advertising;
        self
    }

    /// Set the range check.
    pub fn with_range_check(mut self, range_check: RangeCheck) -> Self {
        self.range_check = range_check;
        self
    }

    /// Set the blink pattern.
    pub fn with_blink(mut self, blink: BlinkPattern) -> Self {
        self.blink = blink;
        self
    }

    /// Set the fallback publish interval.
    pub fn with_fallback_publish_interval(mut self, interval: Duration) -> Self {
        self.fallback_publish_interval = interval;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.advertising.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.advertising.device_name, "D01");
        assert_eq!(config.range_check, RangeCheck::RejectEither);
        assert_eq!(config.parameter_offset, 0);
        assert_eq!(config.blink, BlinkPattern::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = NodeConfig::default()
            .with_range_check(RangeCheck::LegacyRejectBoth)
            .with_fallback_publish_interval(Duration::from_millis(250))
            .with_advertising(AdvertisingConfig::default().with_device_name(""));

        assert_eq!(config.range_check, RangeCheck::LegacyRejectBoth);
        assert_eq!(config.fallback_publish_interval, Duration::from_millis(250));
        assert!(config.validate().is_err());
    }
}
