//! Radio Module
//!
//! Enumerates host radios and readies the chosen one for incoming
//! controller connections.

use crate::infrastructure::bluetooth::BluetoothApi;
use tracing::{error, info};

/// All radios on the host. Enumeration failure is logged and yields none.
pub fn list_radios<B: BluetoothApi>(api: &B) -> Vec<B::Radio> {
    match api.list_radios() {
        Ok(radios) => radios,
        Err(e) => {
            error!("{}", e.with_context("Failed to enumerate Bluetooth radios"));
            Vec::new()
        }
    }
}

/// Release every radio. Handles close themselves on drop and log their own
/// failures, so one bad handle never stops the rest from being released.
pub fn close_all<R>(radios: Vec<R>) {
    let count = radios.len();
    drop(radios);
    info!("Released {} Bluetooth radio handle(s)", count);
}

/// Make the radio accept incoming connections, then make it discoverable.
/// The order matters: discovery is refused on a radio that is not connectable.
///
/// Returns whether the radio ended up both connectable and discoverable.
pub fn prepare_radio<B: BluetoothApi>(api: &B, radio: &B::Radio) -> bool {
    if !api.is_connectable(radio) {
        info!("Making radio accept incoming connections.");
        if let Err(e) = api.enable_incoming_connections(radio) {
            error!("{}", e.with_context("Failed to enable incoming connections"));
        }
    }

    if !api.is_discoverable(radio) {
        info!("Making radio discoverable.");
        if let Err(e) = api.enable_discovery(radio) {
            error!("{}", e.with_context("Failed to make radio discoverable"));
        }
    }

    api.is_connectable(radio) && api.is_discoverable(radio)
}
