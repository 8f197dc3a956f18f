//! BLE Service and Characteristic UUIDs.
//!
//! Contains all UUID constants exposed by the sensor node.

use uuid::Uuid;

/// Human-readable device name put in the advertising payload.
pub const DEVICE_NAME: &str = "D01";

// Advertising
/// Service UUID advertised so centrals can filter scans for this node.
pub const ADVERTISING_UUID: Uuid = Uuid::from_u128(0x3ce05adf_2126_49ed_adca_fb29b1995378);

// Sensor Service (custom)
/// Sensor Service UUID.
pub const SENSOR_SERVICE_UUID: Uuid = Uuid::from_u128(0x71e9d6df_17fd_4a06_bf06_d07387e7fcd6);
/// Temperature characteristic UUID (Notify).
pub const TEMPERATURE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0xbafe94d0_4461_4fd1_b8e6_ce30bfb522e5);
/// Humidity characteristic UUID (Notify).
pub const HUMIDITY_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0xedbec4d4_ab2c_4464_b837_94ab1d08db68);
/// Settings characteristic UUID (Notify, Write, Read).
pub const SETTINGS_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x14b0a352_7384_48a0_8e4c_bb7936f8e96e);

// Descriptors (Standard BLE)
/// Client Characteristic Configuration descriptor UUID (0x2902).
pub const CLIENT_CHARACTERISTIC_CONFIG_UUID: Uuid =
    Uuid::from_u128(0x0000_2902_0000_1000_8000_00805f9b34fb);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            SENSOR_SERVICE_UUID.to_string(),
            "71e9d6df-17fd-4a06-bf06-d07387e7fcd6"
        );
        assert_eq!(
            ADVERTISING_UUID.to_string(),
            "3ce05adf-2126-49ed-adca-fb29b1995378"
        );
        assert!(CLIENT_CHARACTERISTIC_CONFIG_UUID.to_string().contains("2902"));
    }
}
