//! Device Scanner Module
//!
//! Lists the classic Bluetooth devices a radio knows about, optionally
//! running a fresh inquiry first.

use crate::domain::models::{DeviceQuery, DeviceRecord};
use crate::error::OsResult;
use crate::infrastructure::bluetooth::protocol::INQUIRY_UNIT_MS;
use crate::infrastructure::bluetooth::BluetoothApi;
use tracing::{debug, error};

/// List devices on `radio`.
///
/// With `force_inquiry` the OS scans the air for up to
/// `timeout_multiplier * 1.28 s` on top of returning known devices. Nothing
/// found is an empty list. Other query failures are logged and also read as
/// an empty list; only a lost radio is returned as an error.
pub fn list_devices<B: BluetoothApi>(
    api: &B,
    radio: &B::Radio,
    force_inquiry: bool,
    timeout_multiplier: u8,
) -> OsResult<Vec<DeviceRecord>> {
    let query = DeviceQuery::everything(timeout_multiplier, force_inquiry);
    if force_inquiry {
        debug!(
            "Issuing inquiry ({} ms window)",
            (timeout_multiplier as f64 * INQUIRY_UNIT_MS) as u64
        );
    }

    match api.find_devices(radio, &query) {
        Ok(devices) => Ok(devices),
        Err(e) if e.is_radio_lost() => Err(e.with_context("Bluetooth radio lost")),
        Err(e) => {
            error!("{}", e.with_context("Failed to enumerate devices"));
            Ok(Vec::new())
        }
    }
}
