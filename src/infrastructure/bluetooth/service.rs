//! HID Service Module
//!
//! Queries and enables the HID service class for a remote device.

use crate::domain::models::DeviceRecord;
use crate::error::OsResult;
use crate::infrastructure::bluetooth::protocol::HID_SERVICE_CLASS;
use crate::infrastructure::bluetooth::BluetoothApi;
use tracing::{debug, error, info};

/// Whether the HID service is installed for `device`. Query failures are
/// logged and reported as "not enabled".
pub fn is_hid_service_enabled<B: BluetoothApi>(
    api: &B,
    radio: &B::Radio,
    device: &DeviceRecord,
) -> bool {
    match api.installed_services(radio, device) {
        Ok(services) => {
            debug!("{} has {} installed services", device.address, services.len());
            services.contains(&HID_SERVICE_CLASS)
        }
        Err(e) => {
            error!("{}", e.with_context("Failed to enumerate installed services"));
            false
        }
    }
}

/// Ask the OS to enable the HID service. The error carries the OS status code.
pub fn enable_hid_service<B: BluetoothApi>(
    api: &B,
    radio: &B::Radio,
    device: &DeviceRecord,
) -> OsResult<()> {
    info!("Enabling HID service for {}", device.address);
    api.set_service_state(radio, device, HID_SERVICE_CLASS, true)
        .map_err(|e| e.with_context("Failed to enable HID service"))
}
