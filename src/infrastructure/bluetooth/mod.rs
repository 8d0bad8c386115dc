//! Bluetooth Module
//!
//! Classic Bluetooth access for pairing motion controllers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       pairing                            │
//! │        (retry loop, verification, scan cycles)           │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐
//! │  Radio    │  │  Scanner   │  │ Service  │
//! │           │  │            │  │          │
//! │ - listing │  │ - inquiry  │  │ - HID    │
//! │ - setup   │  │ - cached   │  │   state  │
//! └─────┬─────┘  └─────┬──────┘  └────┬─────┘
//!       └──────────────┼──────────────┘
//!                      ▼
//!              BluetoothApi (win32)
//! ```
//!
//! ## Modules
//!
//! - [`pairing`] - Retry loop and scan cycles driving each controller
//! - [`protocol`] - Service class ids and inquiry constants
//! - [`radio`] - Radio enumeration, preparation and release
//! - [`scanner`] - Device enumeration
//! - [`service`] - HID service state
//! - [`verifier`] - Multi-sample connection check
//! - `win32` - `BluetoothApi` over the Win32 Bluetooth API (Windows only)

pub mod pairing;
pub mod protocol;
pub mod radio;
pub mod scanner;
pub mod service;
pub mod verifier;
#[cfg(windows)]
pub mod win32;

use crate::domain::models::{BluetoothAddress, DeviceQuery, DeviceRecord, RadioInfo};
use crate::error::OsResult;

/// The slice of the host Bluetooth stack the pairing tool needs.
///
/// Every call is a single blocking request to the OS; nothing is cached here.
pub trait BluetoothApi {
    type Radio;

    fn list_radios(&self) -> OsResult<Vec<Self::Radio>>;
    fn radio_info(&self, radio: &Self::Radio) -> OsResult<RadioInfo>;

    fn is_connectable(&self, radio: &Self::Radio) -> bool;
    fn enable_incoming_connections(&self, radio: &Self::Radio) -> OsResult<()>;
    fn is_discoverable(&self, radio: &Self::Radio) -> bool;
    fn enable_discovery(&self, radio: &Self::Radio) -> OsResult<()>;

    /// Devices matching `query`. An empty result is `Ok`, not an error.
    fn find_devices(&self, radio: &Self::Radio, query: &DeviceQuery)
        -> OsResult<Vec<DeviceRecord>>;
    fn device_info(&self, radio: &Self::Radio, address: BluetoothAddress)
        -> OsResult<DeviceRecord>;

    fn installed_services(&self, radio: &Self::Radio, device: &DeviceRecord)
        -> OsResult<Vec<u128>>;
    fn set_service_state(
        &self,
        radio: &Self::Radio,
        device: &DeviceRecord,
        service: u128,
        enabled: bool,
    ) -> OsResult<()>;

    fn remove_device(&self, address: BluetoothAddress) -> OsResult<()>;
}
