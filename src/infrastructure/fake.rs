//! Scripted stand-ins for the OS used by unit tests.

use crate::domain::cancel::CancellationToken;
use crate::domain::models::{BluetoothAddress, DeviceQuery, DeviceRecord, RadioInfo};
use crate::domain::timing::Sleeper;
use crate::error::{OsError, OsResult};
use crate::infrastructure::bluetooth::protocol::HID_SERVICE_CLASS;
use crate::infrastructure::bluetooth::BluetoothApi;
use crate::infrastructure::registry::{ConfigKey, ConfigStore};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

/// Fake Bluetooth stack. Radios are plain indices.
///
/// `device_info` replays a script of responses; the last entry repeats once the
/// script is exhausted.
pub struct FakeBluetooth {
    pub radio_address: BluetoothAddress,
    radio_count: u32,
    radio_info_error: RefCell<Option<OsError>>,
    connectable: Cell<bool>,
    discoverable: Cell<bool>,
    enable_incoming_error: RefCell<Option<OsError>>,
    enable_discovery_error: RefCell<Option<OsError>>,
    scans: RefCell<VecDeque<OsResult<Vec<DeviceRecord>>>>,
    queries: RefCell<Vec<DeviceQuery>>,
    cancel_after_scans: RefCell<Option<(usize, CancellationToken)>>,
    device_script: RefCell<VecDeque<OsResult<DeviceRecord>>>,
    device_info_calls: Cell<u32>,
    hid_enabled: Cell<bool>,
    services_error: RefCell<Option<OsError>>,
    enable_error: RefCell<Option<OsError>>,
    service_enable_calls: Cell<u32>,
    remove_error: RefCell<Option<OsError>>,
    removed: RefCell<Vec<BluetoothAddress>>,
}

impl FakeBluetooth {
    pub fn new() -> Self {
        Self {
            radio_address: BluetoothAddress([0xff, 0xee, 0xdd, 0xcc, 0xbb, 0xaa]),
            radio_count: 1,
            radio_info_error: RefCell::new(None),
            connectable: Cell::new(true),
            discoverable: Cell::new(true),
            enable_incoming_error: RefCell::new(None),
            enable_discovery_error: RefCell::new(None),
            scans: RefCell::new(VecDeque::new()),
            queries: RefCell::new(Vec::new()),
            cancel_after_scans: RefCell::new(None),
            device_script: RefCell::new(VecDeque::new()),
            device_info_calls: Cell::new(0),
            hid_enabled: Cell::new(false),
            services_error: RefCell::new(None),
            enable_error: RefCell::new(None),
            service_enable_calls: Cell::new(0),
            remove_error: RefCell::new(None),
            removed: RefCell::new(Vec::new()),
        }
    }

    pub fn with_radios(mut self, count: u32) -> Self {
        self.radio_count = count;
        self
    }

    pub fn fail_radio_info(&self, err: OsError) {
        *self.radio_info_error.borrow_mut() = Some(err);
    }

    pub fn set_radio_state(&self, connectable: bool, discoverable: bool) {
        self.connectable.set(connectable);
        self.discoverable.set(discoverable);
    }

    pub fn fail_enable_incoming(&self, err: OsError) {
        *self.enable_incoming_error.borrow_mut() = Some(err);
    }

    pub fn fail_enable_discovery(&self, err: OsError) {
        *self.enable_discovery_error.borrow_mut() = Some(err);
    }

    pub fn push_scan(&self, result: OsResult<Vec<DeviceRecord>>) {
        self.scans.borrow_mut().push_back(result);
    }

    pub fn queries(&self) -> Vec<DeviceQuery> {
        self.queries.borrow().clone()
    }

    /// Cancel `token` as soon as `count` scans have been served.
    pub fn cancel_after_scans(&self, count: usize, token: CancellationToken) {
        *self.cancel_after_scans.borrow_mut() = Some((count, token));
    }

    pub fn script_device(&self, responses: Vec<OsResult<DeviceRecord>>) {
        *self.device_script.borrow_mut() = responses.into();
    }

    pub fn device_info_calls(&self) -> u32 {
        self.device_info_calls.get()
    }

    pub fn set_hid_enabled(&self, enabled: bool) {
        self.hid_enabled.set(enabled);
    }

    pub fn fail_services(&self, err: OsError) {
        *self.services_error.borrow_mut() = Some(err);
    }

    pub fn fail_service_enable(&self, err: OsError) {
        *self.enable_error.borrow_mut() = Some(err);
    }

    pub fn service_enable_calls(&self) -> u32 {
        self.service_enable_calls.get()
    }

    pub fn fail_remove(&self, err: OsError) {
        *self.remove_error.borrow_mut() = Some(err);
    }

    pub fn removed(&self) -> Vec<BluetoothAddress> {
        self.removed.borrow().clone()
    }
}

impl BluetoothApi for FakeBluetooth {
    type Radio = u32;

    fn list_radios(&self) -> OsResult<Vec<u32>> {
        Ok((0..self.radio_count).collect())
    }

    fn radio_info(&self, radio: &u32) -> OsResult<RadioInfo> {
        if let Some(err) = self.radio_info_error.borrow().clone() {
            return Err(err);
        }
        Ok(RadioInfo {
            address: self.radio_address,
            name: format!("radio-{}", radio),
        })
    }

    fn is_connectable(&self, _radio: &u32) -> bool {
        self.connectable.get()
    }

    fn enable_incoming_connections(&self, _radio: &u32) -> OsResult<()> {
        if let Some(err) = self.enable_incoming_error.borrow().clone() {
            return Err(err);
        }
        self.connectable.set(true);
        Ok(())
    }

    fn is_discoverable(&self, _radio: &u32) -> bool {
        self.discoverable.get()
    }

    fn enable_discovery(&self, _radio: &u32) -> OsResult<()> {
        if let Some(err) = self.enable_discovery_error.borrow().clone() {
            return Err(err);
        }
        // Discovery only sticks on a connectable radio.
        if self.connectable.get() {
            self.discoverable.set(true);
        }
        Ok(())
    }

    fn find_devices(&self, _radio: &u32, query: &DeviceQuery) -> OsResult<Vec<DeviceRecord>> {
        self.queries.borrow_mut().push(*query);
        let served = self.queries.borrow().len();
        if let Some((count, token)) = self.cancel_after_scans.borrow().as_ref() {
            if served >= *count {
                token.cancel();
            }
        }
        self.scans.borrow_mut().pop_front().unwrap_or(Ok(Vec::new()))
    }

    fn device_info(&self, _radio: &u32, address: BluetoothAddress) -> OsResult<DeviceRecord> {
        self.device_info_calls.set(self.device_info_calls.get() + 1);
        let mut script = self.device_script.borrow_mut();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.unwrap_or_else(|| {
            Ok(DeviceRecord {
                address,
                ..Default::default()
            })
        })
    }

    fn installed_services(&self, _radio: &u32, _device: &DeviceRecord) -> OsResult<Vec<u128>> {
        if let Some(err) = self.services_error.borrow().clone() {
            return Err(err);
        }
        if self.hid_enabled.get() {
            Ok(vec![0x0000_1200_0000_1000_8000_00805F9B34FB, HID_SERVICE_CLASS])
        } else {
            Ok(vec![0x0000_1200_0000_1000_8000_00805F9B34FB])
        }
    }

    fn set_service_state(
        &self,
        _radio: &u32,
        _device: &DeviceRecord,
        service: u128,
        enabled: bool,
    ) -> OsResult<()> {
        self.service_enable_calls
            .set(self.service_enable_calls.get() + 1);
        if let Some(err) = self.enable_error.borrow().clone() {
            return Err(err);
        }
        if service == HID_SERVICE_CLASS {
            self.hid_enabled.set(enabled);
        }
        Ok(())
    }

    fn remove_device(&self, address: BluetoothAddress) -> OsResult<()> {
        if let Some(err) = self.remove_error.borrow().clone() {
            return Err(err);
        }
        self.removed.borrow_mut().push(address);
        Ok(())
    }
}

#[derive(Default)]
struct RegistryState {
    keys: HashMap<String, HashMap<String, u32>>,
    opened: Vec<String>,
    writes: Vec<u32>,
    write_error: Option<OsError>,
}

/// In-memory registry; keys must be created before they can be opened.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_key(&self, path: &str) {
        self.state
            .borrow_mut()
            .keys
            .entry(path.to_string())
            .or_default();
    }

    pub fn value(&self, path: &str, name: &str) -> Option<u32> {
        self.state
            .borrow()
            .keys
            .get(path)
            .and_then(|values| values.get(name).copied())
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.borrow().opened.clone()
    }

    pub fn writes(&self) -> Vec<u32> {
        self.state.borrow().writes.clone()
    }

    pub fn fail_writes(&self, err: OsError) {
        self.state.borrow_mut().write_error = Some(err);
    }
}

pub struct FakeKey {
    path: String,
    state: Rc<RefCell<RegistryState>>,
}

impl ConfigStore for FakeRegistry {
    type Key = FakeKey;

    fn open_key(&self, subkey: &str) -> OsResult<FakeKey> {
        let mut state = self.state.borrow_mut();
        state.opened.push(subkey.to_string());
        if !state.keys.contains_key(subkey) {
            return Err(OsError::new("RegOpenKeyExW", 2));
        }
        Ok(FakeKey {
            path: subkey.to_string(),
            state: Rc::clone(&self.state),
        })
    }
}

impl ConfigKey for FakeKey {
    fn get_dword(&self, name: &str) -> OsResult<u32> {
        self.state
            .borrow()
            .keys
            .get(&self.path)
            .and_then(|values| values.get(name).copied())
            .ok_or_else(|| OsError::new("RegQueryValueExW", 2))
    }

    fn set_dword(&self, name: &str, value: u32) -> OsResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.write_error.clone() {
            return Err(err);
        }
        state.writes.push(value);
        state
            .keys
            .entry(self.path.clone())
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }
}

/// Records every requested pause instead of blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    pauses: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.pauses.borrow().len()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}
