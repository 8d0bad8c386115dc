//! Pairing orchestration
//!
//! Per device the protocol moves through
//! `Discovered -> Connecting -> ServiceCheck -> Verifying -> Confirmed`, or
//! ends in `Removed` when the controller never connects within the retry
//! bound. The scan loop applies it to every matching device, one at a time.

use crate::domain::cancel::CancellationToken;
use crate::domain::controller::ControllerClassifier;
use crate::domain::models::{DeviceRecord, PairingOutcome};
use crate::domain::settings::{scan_interval_for, PairingSettings};
use crate::domain::timing::Sleeper;
use crate::error::OsResult;
use crate::infrastructure::bluetooth::protocol::MAX_INQUIRY_TIMEOUT_MULTIPLIER;
use crate::infrastructure::bluetooth::scanner::list_devices;
use crate::infrastructure::bluetooth::service::{enable_hid_service, is_hid_service_enabled};
use crate::infrastructure::bluetooth::verifier::ConnectionVerifier;
use crate::infrastructure::bluetooth::BluetoothApi;
use crate::infrastructure::registry::{mark_virtually_cabled, ConfigStore};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry and timing policy. Exact counts are part of the observable
/// behaviour; the loops never back off.
#[derive(Debug, Clone, PartialEq)]
pub struct PairingPolicy {
    pub connection_retries: u32,
    pub connection_retry_delay: Duration,
    pub verify_samples: u32,
    pub verify_sample_delay: Duration,
    pub inquiry_every_n_scans: NonZeroU32,
    pub inquiry_timeout_multiplier: u8,
    pub scan_interval: Duration,
}

impl PairingPolicy {
    /// Build a policy from settings, replacing out-of-range values with their
    /// defaults.
    pub fn from_settings(settings: &PairingSettings) -> Self {
        let defaults = PairingSettings::default();

        let connection_retries = non_zero(
            "connection_retries",
            settings.connection_retries,
            defaults.connection_retries,
        )
        .get();
        let verify_samples = non_zero(
            "verify_samples",
            settings.verify_samples,
            defaults.verify_samples,
        )
        .get();
        let inquiry_every_n_scans = non_zero(
            "inquiry_every_n_scans",
            settings.inquiry_every_n_scans,
            defaults.inquiry_every_n_scans,
        );

        let inquiry_timeout_multiplier = if (1..=MAX_INQUIRY_TIMEOUT_MULTIPLIER)
            .contains(&settings.inquiry_timeout_multiplier)
        {
            settings.inquiry_timeout_multiplier
        } else {
            warn!(
                "inquiry_timeout_multiplier {} outside 1..={}, using {}",
                settings.inquiry_timeout_multiplier,
                MAX_INQUIRY_TIMEOUT_MULTIPLIER,
                defaults.inquiry_timeout_multiplier
            );
            defaults.inquiry_timeout_multiplier
        };

        let scan_interval_ms = settings.scan_interval_ms;

        let inquiry_window_ms = scan_interval_for(inquiry_timeout_multiplier);
        if scan_interval_ms < inquiry_window_ms {
            warn!(
                "scan_interval_ms {} is shorter than the inquiry window (~{} ms)",
                scan_interval_ms, inquiry_window_ms
            );
        }

        Self {
            connection_retries,
            connection_retry_delay: Duration::from_millis(settings.connection_retry_delay_ms),
            verify_samples,
            verify_sample_delay: Duration::from_millis(settings.verify_sample_delay_ms),
            inquiry_every_n_scans,
            inquiry_timeout_multiplier,
            scan_interval: Duration::from_millis(scan_interval_ms),
        }
    }

    /// Whether scan cycle `cycle` (counted from 0) runs a fresh inquiry.
    pub fn forces_inquiry(&self, cycle: u64) -> bool {
        cycle % u64::from(self.inquiry_every_n_scans.get()) == 0
    }
}

impl Default for PairingPolicy {
    fn default() -> Self {
        Self::from_settings(&PairingSettings::default())
    }
}

fn non_zero(name: &str, value: u32, default: u32) -> NonZeroU32 {
    NonZeroU32::new(value)
        .or_else(|| {
            warn!("{} must be at least 1, using {}", name, default);
            NonZeroU32::new(default)
        })
        .unwrap_or(NonZeroU32::MIN)
}

/// Drives controllers on one radio through the pairing protocol.
pub struct Pairer<'a, B: BluetoothApi, S: ConfigStore, T: Sleeper> {
    api: &'a B,
    store: &'a S,
    sleeper: &'a T,
    radio: &'a B::Radio,
    classifier: ControllerClassifier,
    policy: PairingPolicy,
}

impl<'a, B: BluetoothApi, S: ConfigStore, T: Sleeper> Pairer<'a, B, S, T> {
    pub fn new(
        api: &'a B,
        store: &'a S,
        sleeper: &'a T,
        radio: &'a B::Radio,
        classifier: ControllerClassifier,
        policy: PairingPolicy,
    ) -> Self {
        Self {
            api,
            store,
            sleeper,
            radio,
            classifier,
            policy,
        }
    }

    /// Scan until `cancel` is set. Cancellation is only observed between
    /// cycles; a device that is mid-protocol is always finished first.
    ///
    /// Returns an error only when the radio itself is lost.
    pub fn run(&self, cancel: &CancellationToken) -> OsResult<()> {
        let mut cycle: u64 = 0;
        while !cancel.is_cancelled() {
            self.scan_once(cycle)?;
            cycle += 1;
            self.sleeper.sleep(self.policy.scan_interval);
        }
        info!("Stop requested, leaving scan loop after {} cycle(s)", cycle);
        Ok(())
    }

    /// One scan cycle: list devices, report them all, and run the pairing
    /// protocol for each target controller in discovery order.
    pub fn scan_once(&self, cycle: u64) -> OsResult<Vec<(DeviceRecord, PairingOutcome)>> {
        let devices = list_devices(
            self.api,
            self.radio,
            self.policy.forces_inquiry(cycle),
            self.policy.inquiry_timeout_multiplier,
        )?;

        if devices.is_empty() {
            info!("No Bluetooth devices found.");
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::new();
        for (index, device) in devices.iter().enumerate() {
            info!("Device: ({}) {}", index, device);

            if !self.classifier.is_target_controller(device) {
                continue;
            }

            info!(
                "device #{}: {} detected",
                index,
                self.classifier.product_name()
            );
            let outcome = self.pair_device(device);
            debug!(
                "{} finished after {} attempt(s): {:?}",
                device.address,
                outcome.attempts(),
                outcome
            );
            outcomes.push((device.clone(), outcome));
        }

        Ok(outcomes)
    }

    /// Run the pairing protocol for one controller.
    pub fn pair_device(&self, discovered: &DeviceRecord) -> PairingOutcome {
        let retries = self.policy.connection_retries;
        let mut record = discovered.clone();
        let mut attempts = 0;

        for attempt in 1..=retries {
            attempts = attempt;

            match self.api.device_info(self.radio, record.address) {
                Ok(fresh) => record = fresh,
                Err(e) => {
                    error!("{}", e.with_context("Failed to read device info"));
                    break;
                }
            }

            if record.connected {
                if self.connect_attempt(&mut record) {
                    info!("- !!!! Successfully connected device {} !!!!", record.address);
                    return PairingOutcome::Confirmed { attempts };
                }
            } else {
                debug!(
                    "{} not connected yet (attempt {}/{})",
                    record.address, attempt, retries
                );
            }

            self.sleeper.sleep(self.policy.connection_retry_delay);
        }

        if record.connected {
            warn!(
                "Gave up on {} after {} attempt(s) without a stable connection",
                record.address, attempts
            );
            return PairingOutcome::Unconfirmed { attempts };
        }

        match self.api.remove_device(record.address) {
            Ok(()) => {
                info!("Device {} removed - retry", record.address);
                PairingOutcome::Removed { attempts }
            }
            Err(e) => {
                error!("{}", e.with_context("Failed to remove device"));
                PairingOutcome::Unconfirmed { attempts }
            }
        }
    }

    /// Service check and verification for a device that reads as connected.
    /// `false` sends the caller back to the retry loop.
    fn connect_attempt(&self, record: &mut DeviceRecord) -> bool {
        mark_virtually_cabled(self.api, self.store, self.radio, record);

        debug!("- checking HID service");
        if !is_hid_service_enabled(self.api, self.radio, record) {
            debug!("- enabling HID service");
            if let Err(e) = enable_hid_service(self.api, self.radio, record) {
                error!("{}", e);
                return false;
            }
            // Enabling the service can clear the flag.
            mark_virtually_cabled(self.api, self.store, self.radio, record);
        }

        debug!("- verifying successful connection");
        ConnectionVerifier::new(
            self.api,
            self.sleeper,
            self.policy.verify_samples,
            self.policy.verify_sample_delay,
        )
        .is_stably_connected(self.radio, record)
    }
}
