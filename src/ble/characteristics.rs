//! GATT characteristic definitions and value buffers.
//!
//! Describes the three characteristics of the sensor service and owns the
//! outward value each one presents to connected centrals.

use bytes::Bytes;
use uuid::Uuid;

use crate::ble::uuids::*;
use crate::error::{Error, Result};

/// Largest value a characteristic may carry on this transport (ATT MTU 23 - 3).
pub const MAX_PAYLOAD_LEN: usize = 20;

/// Capability flags of a characteristic.
///
/// Bit values follow the GATT characteristic properties field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacteristicProperties(u8);

impl CharacteristicProperties {
    /// Value can be read by the central.
    pub const READ: Self = Self(0x02);
    /// Value can be written (with response) by the central.
    pub const WRITE: Self = Self(0x08);
    /// Value changes are pushed to subscribed centrals.
    pub const NOTIFY: Self = Self(0x10);

    /// Combine two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check if every flag in `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Get the raw properties byte.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

/// The characteristics exposed by the sensor service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharacteristicKind {
    /// Ambient temperature, pushed by the publish path.
    Temperature,
    /// Relative humidity, pushed by the publish path.
    Humidity,
    /// The persisted sampling interval.
    Settings,
}

impl CharacteristicKind {
    /// All characteristics, in registration order.
    pub const ALL: [Self; 3] = [Self::Humidity, Self::Temperature, Self::Settings];

    /// Get the characteristic UUID.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Temperature => TEMPERATURE_CHARACTERISTIC_UUID,
            Self::Humidity => HUMIDITY_CHARACTERISTIC_UUID,
            Self::Settings => SETTINGS_CHARACTERISTIC_UUID,
        }
    }

    /// Look up a characteristic by UUID.
    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.uuid() == *uuid)
    }

    /// Get the capability flags.
    pub fn properties(&self) -> CharacteristicProperties {
        match self {
            Self::Temperature | Self::Humidity => CharacteristicProperties::NOTIFY,
            Self::Settings => CharacteristicProperties::NOTIFY
                .union(CharacteristicProperties::WRITE)
                .union(CharacteristicProperties::READ),
        }
    }

    /// Check if centrals can subscribe to this characteristic.
    pub fn is_notify(&self) -> bool {
        self.properties().contains(CharacteristicProperties::NOTIFY)
    }

    fn index(&self) -> usize {
        match self {
            Self::Temperature => 0,
            Self::Humidity => 1,
            Self::Settings => 2,
        }
    }
}

impl std::fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temperature => write!(f, "Temperature"),
            Self::Humidity => write!(f, "Humidity"),
            Self::Settings => write!(f, "Settings"),
        }
    }
}

/// Transient outward value of one characteristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacteristicValue {
    data: Bytes,
}

impl CharacteristicValue {
    /// Replace the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if `payload` exceeds [`MAX_PAYLOAD_LEN`];
    /// the previous value is kept.
    pub fn set(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        self.data = Bytes::copy_from_slice(payload);
        Ok(())
    }

    /// Get the current value.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get a cheap clone of the current value.
    pub fn to_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Check if no value has been set.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Definition of a characteristic handed to the transport at bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicDefinition {
    /// Which characteristic this is.
    pub kind: CharacteristicKind,
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// Capability flags.
    pub properties: CharacteristicProperties,
    /// Attached descriptor UUIDs.
    pub descriptors: Vec<Uuid>,
}

impl CharacteristicDefinition {
    /// Build the definition for a kind, attaching the client configuration
    /// descriptor when the characteristic is notify-capable.
    pub fn for_kind(kind: CharacteristicKind) -> Self {
        let descriptors = if kind.is_notify() {
            vec![CLIENT_CHARACTERISTIC_CONFIG_UUID]
        } else {
            Vec::new()
        };

        Self {
            kind,
            uuid: kind.uuid(),
            properties: kind.properties(),
            descriptors,
        }
    }
}

/// Definition of the service registered with the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    /// Service UUID.
    pub uuid: Uuid,
    /// Characteristics, in registration order.
    pub characteristics: Vec<CharacteristicDefinition>,
}

impl ServiceDefinition {
    /// The sensor service with Temperature, Humidity and Settings.
    pub fn sensor_service() -> Self {
        Self {
            uuid: SENSOR_SERVICE_UUID,
            characteristics: CharacteristicKind::ALL
                .into_iter()
                .map(CharacteristicDefinition::for_kind)
                .collect(),
        }
    }

    /// Get a characteristic definition by UUID.
    pub fn characteristic(&self, uuid: &Uuid) -> Result<&CharacteristicDefinition> {
        self.characteristics
            .iter()
            .find(|c| c.uuid == *uuid)
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }
}

/// The value buffers of every characteristic on the service.
///
/// Owned by the session; policies only touch a buffer for the duration of a call.
#[derive(Debug, Default)]
pub struct CharacteristicSurface {
    values: [CharacteristicValue; 3],
}

impl CharacteristicSurface {
    /// Create a surface with empty values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a characteristic.
    pub fn value(&self, kind: CharacteristicKind) -> &CharacteristicValue {
        &self.values[kind.index()]
    }

    /// Get mutable access to the value of a characteristic.
    pub fn value_mut(&mut self, kind: CharacteristicKind) -> &mut CharacteristicValue {
        &mut self.values[kind.index()]
    }
}
