use crate::domain::models::DeviceRecord;
use crate::domain::timing::Sleeper;
use crate::infrastructure::bluetooth::service::is_hid_service_enabled;
use crate::infrastructure::bluetooth::BluetoothApi;
use std::time::Duration;
use tracing::{debug, error};

/// Confirms a controller link over several consecutive samples.
///
/// The controller reports "connected" for a while before the link is usable,
/// so one positive read is not enough. Every sample must show the device
/// connected, remembered and with the HID service enabled.
pub struct ConnectionVerifier<'a, B: BluetoothApi, T: Sleeper> {
    api: &'a B,
    sleeper: &'a T,
    samples: u32,
    sample_delay: Duration,
}

impl<'a, B: BluetoothApi, T: Sleeper> ConnectionVerifier<'a, B, T> {
    pub fn new(api: &'a B, sleeper: &'a T, samples: u32, sample_delay: Duration) -> Self {
        Self {
            api,
            sleeper,
            samples,
            sample_delay,
        }
    }

    /// Sample the device `samples` times, pausing between samples. The first
    /// failing sample (including a failed read) ends the check with `false`.
    ///
    /// `device` is replaced with each fresh snapshot as it is read.
    pub fn is_stably_connected(&self, radio: &B::Radio, device: &mut DeviceRecord) -> bool {
        let mut markers = String::new();

        for sample in 1..=self.samples {
            match self.api.device_info(radio, device.address) {
                Ok(fresh) => *device = fresh,
                Err(e) => {
                    debug!("Verification samples: {}", markers);
                    error!("{}", e.with_context("Failed to read device info"));
                    return false;
                }
            }

            let hid_enabled = is_hid_service_enabled(self.api, radio, device);
            if device.connected {
                markers.push('C');
            }
            if device.remembered {
                markers.push('R');
            }
            if hid_enabled {
                markers.push('E');
            }

            if !(device.connected && device.remembered && hid_enabled) {
                debug!(
                    "Verification failed at sample {}/{}: {}",
                    sample, self.samples, markers
                );
                return false;
            }
            markers.push('.');

            if sample < self.samples {
                self.sleeper.sleep(self.sample_delay);
            }
        }

        debug!("Verification samples: {}", markers);
        true
    }
}
