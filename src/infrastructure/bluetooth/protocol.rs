//! Motion Controller Bluetooth constants
//!
//! Service class ids and inquiry limits used when pairing the controller
//! over classic Bluetooth.

/// HumanInterfaceDeviceServiceClass (SIG short id 0x1124)
pub const HID_SERVICE_CLASS: u128 = sig_service_class(0x1124);

/// Largest inquiry timeout multiplier the OS accepts
pub const MAX_INQUIRY_TIMEOUT_MULTIPLIER: u8 = 48;

/// Length of one inquiry timeout unit in milliseconds
pub const INQUIRY_UNIT_MS: f64 = 1280.0;

/// Expand a 16-bit SIG assigned number onto the Bluetooth base UUID
pub const fn sig_service_class(short_id: u16) -> u128 {
    ((short_id as u128) << 96) | 0x0000_0000_0000_1000_8000_00805F9B34FB
}
