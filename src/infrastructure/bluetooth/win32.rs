//! Win32 Bluetooth backend
//!
//! `BluetoothApi` over `BluetoothAPIs.h`. Radio handles close themselves on
//! drop so no early return can leak one.

use crate::domain::models::{BluetoothAddress, DeviceQuery, DeviceRecord, RadioInfo};
use crate::error::{OsError, OsResult, ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS};
use crate::infrastructure::bluetooth::BluetoothApi;
use std::mem;
use tracing::{debug, error};
use windows::core::GUID;
use windows::Win32::Devices::Bluetooth::{
    BluetoothEnableDiscovery, BluetoothEnableIncomingConnections,
    BluetoothEnumerateInstalledServices, BluetoothFindDeviceClose, BluetoothFindFirstDevice,
    BluetoothFindFirstRadio, BluetoothFindNextDevice, BluetoothFindNextRadio,
    BluetoothFindRadioClose, BluetoothGetDeviceInfo, BluetoothGetRadioInfo,
    BluetoothIsConnectable, BluetoothIsDiscoverable, BluetoothRemoveDevice,
    BluetoothSetServiceState, BLUETOOTH_ADDRESS, BLUETOOTH_ADDRESS_0, BLUETOOTH_DEVICE_INFO,
    BLUETOOTH_DEVICE_SEARCH_PARAMS, BLUETOOTH_FIND_RADIO_PARAMS, BLUETOOTH_RADIO_INFO,
};
use windows::Win32::Foundation::{CloseHandle, GetLastError, HANDLE};

const SERVICE_DISABLE: u32 = 0x00;
const SERVICE_ENABLE: u32 = 0x01;

/// An open radio handle, closed on drop.
pub struct RadioHandle(HANDLE);

impl Drop for RadioHandle {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.0) } {
            error!(
                "{}",
                from_windows_error("Failed to close Bluetooth radio handle", e)
            );
        }
    }
}

pub struct Win32Bluetooth;

impl BluetoothApi for Win32Bluetooth {
    type Radio = RadioHandle;

    fn list_radios(&self) -> OsResult<Vec<RadioHandle>> {
        let params = BLUETOOTH_FIND_RADIO_PARAMS {
            dwSize: mem::size_of::<BLUETOOTH_FIND_RADIO_PARAMS>() as u32,
        };
        let mut handle = HANDLE::default();

        let find = unsafe { BluetoothFindFirstRadio(&params, &mut handle) }
            .map_err(|e| from_windows_error("BluetoothFindFirstRadio", e))?;

        let mut radios = vec![RadioHandle(handle)];
        loop {
            let mut next = HANDLE::default();
            if unsafe { BluetoothFindNextRadio(find, &mut next) }.is_err() {
                break;
            }
            radios.push(RadioHandle(next));
        }

        if let Err(e) = unsafe { BluetoothFindRadioClose(find) } {
            error!(
                "{}",
                from_windows_error("Failed to close Bluetooth radio enumeration handle", e)
            );
        }

        debug!("Found {} Bluetooth radio(s)", radios.len());
        Ok(radios)
    }

    fn radio_info(&self, radio: &RadioHandle) -> OsResult<RadioInfo> {
        let mut info = BLUETOOTH_RADIO_INFO {
            dwSize: mem::size_of::<BLUETOOTH_RADIO_INFO>() as u64,
            ..Default::default()
        };
        let status = unsafe { BluetoothGetRadioInfo(radio.0, &mut info) };
        if status != 0 {
            return Err(OsError::new("BluetoothGetRadioInfo", status));
        }
        Ok(RadioInfo {
            address: from_native_address(&info.address),
            name: wide_to_string(&info.szName),
        })
    }

    fn is_connectable(&self, radio: &RadioHandle) -> bool {
        unsafe { BluetoothIsConnectable(Some(radio.0)) }.as_bool()
    }

    fn enable_incoming_connections(&self, radio: &RadioHandle) -> OsResult<()> {
        if unsafe { BluetoothEnableIncomingConnections(Some(radio.0), true) }.as_bool() {
            Ok(())
        } else {
            Err(last_error("BluetoothEnableIncomingConnections"))
        }
    }

    fn is_discoverable(&self, radio: &RadioHandle) -> bool {
        unsafe { BluetoothIsDiscoverable(Some(radio.0)) }.as_bool()
    }

    fn enable_discovery(&self, radio: &RadioHandle) -> OsResult<()> {
        if unsafe { BluetoothEnableDiscovery(Some(radio.0), true) }.as_bool() {
            Ok(())
        } else {
            Err(last_error("BluetoothEnableDiscovery"))
        }
    }

    fn find_devices(
        &self,
        radio: &RadioHandle,
        query: &DeviceQuery,
    ) -> OsResult<Vec<DeviceRecord>> {
        let params = BLUETOOTH_DEVICE_SEARCH_PARAMS {
            dwSize: mem::size_of::<BLUETOOTH_DEVICE_SEARCH_PARAMS>() as u32,
            fReturnAuthenticated: query.return_authenticated.into(),
            fReturnRemembered: query.return_remembered.into(),
            fReturnUnknown: query.return_unknown.into(),
            fReturnConnected: query.return_connected.into(),
            fIssueInquiry: query.issue_inquiry.into(),
            cTimeoutMultiplier: query.timeout_multiplier,
            hRadio: radio.0,
        };
        let mut info = empty_device_info();

        let find = match unsafe { BluetoothFindFirstDevice(&params, &mut info) } {
            Ok(find) => find,
            Err(e) => {
                let err = from_windows_error("BluetoothFindFirstDevice", e);
                if err.code == ERROR_NO_MORE_ITEMS {
                    return Ok(Vec::new());
                }
                return Err(err);
            }
        };

        let mut devices = vec![to_record(&info)];
        loop {
            let mut next = empty_device_info();
            if unsafe { BluetoothFindNextDevice(find, &mut next) }.is_err() {
                break;
            }
            devices.push(to_record(&next));
        }

        if let Err(e) = unsafe { BluetoothFindDeviceClose(find) } {
            error!(
                "{}",
                from_windows_error("Failed to close device enumeration handle", e)
            );
        }

        Ok(devices)
    }

    fn device_info(
        &self,
        radio: &RadioHandle,
        address: BluetoothAddress,
    ) -> OsResult<DeviceRecord> {
        let mut info = native_device(address);
        let status = unsafe { BluetoothGetDeviceInfo(Some(radio.0), &mut info) };
        if status != 0 {
            return Err(OsError::new("BluetoothGetDeviceInfo", status));
        }
        Ok(to_record(&info))
    }

    fn installed_services(
        &self,
        radio: &RadioHandle,
        device: &DeviceRecord,
    ) -> OsResult<Vec<u128>> {
        let info = native_device(device.address);

        // The count query sometimes reports ERROR_MORE_DATA and sometimes not;
        // the count is right either way.
        let mut count: u32 = 0;
        let status =
            unsafe { BluetoothEnumerateInstalledServices(Some(radio.0), &info, &mut count, None) };
        if status != 0 && status != ERROR_MORE_DATA {
            return Err(OsError::new("BluetoothEnumerateInstalledServices", status));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut services = vec![GUID::zeroed(); count as usize];
        let status = unsafe {
            BluetoothEnumerateInstalledServices(
                Some(radio.0),
                &info,
                &mut count,
                Some(services.as_mut_ptr()),
            )
        };
        if status != 0 {
            return Err(OsError::new("BluetoothEnumerateInstalledServices", status));
        }

        services.truncate(count as usize);
        Ok(services.iter().map(GUID::to_u128).collect())
    }

    fn set_service_state(
        &self,
        radio: &RadioHandle,
        device: &DeviceRecord,
        service: u128,
        enabled: bool,
    ) -> OsResult<()> {
        let info = native_device(device.address);
        let guid = GUID::from_u128(service);
        let flags = if enabled { SERVICE_ENABLE } else { SERVICE_DISABLE };
        let status = unsafe { BluetoothSetServiceState(Some(radio.0), &info, &guid, flags) };
        if status != 0 {
            return Err(OsError::new("BluetoothSetServiceState", status));
        }
        Ok(())
    }

    fn remove_device(&self, address: BluetoothAddress) -> OsResult<()> {
        let native = to_native_address(address);
        let status = unsafe { BluetoothRemoveDevice(&native) };
        if status != 0 {
            return Err(OsError::new("BluetoothRemoveDevice", status));
        }
        Ok(())
    }
}

fn empty_device_info() -> BLUETOOTH_DEVICE_INFO {
    BLUETOOTH_DEVICE_INFO {
        dwSize: mem::size_of::<BLUETOOTH_DEVICE_INFO>() as u32,
        ..Default::default()
    }
}

fn native_device(address: BluetoothAddress) -> BLUETOOTH_DEVICE_INFO {
    BLUETOOTH_DEVICE_INFO {
        Address: to_native_address(address),
        ..empty_device_info()
    }
}

fn to_native_address(address: BluetoothAddress) -> BLUETOOTH_ADDRESS {
    BLUETOOTH_ADDRESS {
        Anonymous: BLUETOOTH_ADDRESS_0 {
            ullLong: address.as_u64(),
        },
    }
}

fn from_native_address(address: &BLUETOOTH_ADDRESS) -> BluetoothAddress {
    BluetoothAddress(unsafe { address.Anonymous.rgBytes })
}

fn to_record(info: &BLUETOOTH_DEVICE_INFO) -> DeviceRecord {
    DeviceRecord {
        address: from_native_address(&info.Address),
        name: wide_to_string(&info.szName),
        class_of_device: info.ulClassofDevice,
        connected: info.fConnected.as_bool(),
        remembered: info.fRemembered.as_bool(),
        authenticated: info.fAuthenticated.as_bool(),
    }
}

fn wide_to_string(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

fn last_error(context: &str) -> OsError {
    OsError::new(context, unsafe { GetLastError() }.0)
}

/// Map a `windows::core::Error` back onto its Win32 status code.
fn from_windows_error(context: &str, e: windows::core::Error) -> OsError {
    let hr = e.code().0 as u32;
    let code = if hr & 0xFFFF_0000 == 0x8007_0000 {
        hr & 0xFFFF
    } else {
        hr
    };
    OsError::new(context, code)
}
