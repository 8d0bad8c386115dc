//! Pairing durability patch
//!
//! Windows drops a freshly paired controller shortly after it connects unless
//! the HID Bluetooth driver treats the link as "virtually cabled". The flag
//! lives under the driver's per-device parameters key in HKLM.

use crate::domain::models::{BluetoothAddress, DeviceRecord};
use crate::error::OsResult;
use crate::infrastructure::bluetooth::BluetoothApi;
use tracing::{debug, error, info, warn};

pub const HIDBTH_DEVICES_KEY: &str = r"SYSTEM\CurrentControlSet\Services\HidBth\Parameters\Devices\";

pub const VIRTUALLY_CABLED: &str = "VirtuallyCabled";

/// Host configuration store keyed by subkey path.
pub trait ConfigStore {
    type Key: ConfigKey;

    /// Open an existing key for reading and writing.
    fn open_key(&self, subkey: &str) -> OsResult<Self::Key>;
}

/// An open key. Released when dropped.
pub trait ConfigKey {
    fn get_dword(&self, name: &str) -> OsResult<u32>;
    fn set_dword(&self, name: &str, value: u32) -> OsResult<()>;
}

/// Subkey holding the HID driver parameters for one radio/device pair.
pub fn device_parameters_path(radio: BluetoothAddress, device: BluetoothAddress) -> String {
    format!(
        "{}{}{}",
        HIDBTH_DEVICES_KEY,
        radio.to_registry_hex(),
        device.to_registry_hex()
    )
}

/// Set `VirtuallyCabled = 1` for the device on this radio.
///
/// Returns `false` (after logging) when the radio address cannot be read, the
/// key cannot be opened, or the value cannot be written. The previous value
/// is read back for the log only.
pub fn mark_virtually_cabled<B, S>(
    api: &B,
    store: &S,
    radio: &B::Radio,
    device: &DeviceRecord,
) -> bool
where
    B: BluetoothApi,
    S: ConfigStore,
{
    let radio_info = match api.radio_info(radio) {
        Ok(info) => info,
        Err(e) => {
            error!("{}", e.with_context("Failed to get radio info"));
            return false;
        }
    };

    let subkey = device_parameters_path(radio_info.address, device.address);
    debug!("Durability key: {}", subkey);

    let key = match store.open_key(&subkey) {
        Ok(key) => key,
        Err(e) => {
            error!("{}", e.with_context("Failed to open registry key"));
            return false;
        }
    };

    match key.get_dword(VIRTUALLY_CABLED) {
        Ok(previous) => debug!("Get {}: {}", VIRTUALLY_CABLED, previous),
        Err(e) => warn!("{}", e.with_context("Failed to get registry value")),
    }

    if let Err(e) = key.set_dword(VIRTUALLY_CABLED, 1) {
        error!("{}", e.with_context("Failed to set registry value"));
        return false;
    }

    info!("Set {}: 1 for {}", VIRTUALLY_CABLED, device.address);
    true
}

#[cfg(windows)]
pub use win32::LocalMachineRegistry;

#[cfg(windows)]
mod win32 {
    use super::{ConfigKey, ConfigStore};
    use crate::error::{OsError, OsResult};
    use tracing::error;
    use windows::core::HSTRING;
    use windows::Win32::Foundation::ERROR_SUCCESS;
    use windows::Win32::System::Registry::{
        RegCloseKey, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY, HKEY_LOCAL_MACHINE,
        KEY_ALL_ACCESS, KEY_WOW64_64KEY, REG_DWORD, REG_VALUE_TYPE,
    };

    /// `HKEY_LOCAL_MACHINE`, 64-bit view.
    pub struct LocalMachineRegistry;

    pub struct RegistryKey {
        handle: HKEY,
    }

    impl ConfigStore for LocalMachineRegistry {
        type Key = RegistryKey;

        fn open_key(&self, subkey: &str) -> OsResult<RegistryKey> {
            let subkey = HSTRING::from(subkey);
            let mut handle = HKEY::default();
            let status = unsafe {
                RegOpenKeyExW(
                    HKEY_LOCAL_MACHINE,
                    &subkey,
                    Some(0),
                    KEY_ALL_ACCESS | KEY_WOW64_64KEY,
                    &mut handle,
                )
            };
            if status != ERROR_SUCCESS {
                return Err(OsError::new("RegOpenKeyExW", status.0));
            }
            Ok(RegistryKey { handle })
        }
    }

    impl ConfigKey for RegistryKey {
        fn get_dword(&self, name: &str) -> OsResult<u32> {
            let name = HSTRING::from(name);
            let mut value: u32 = 0;
            let mut size = std::mem::size_of::<u32>() as u32;
            let mut kind = REG_VALUE_TYPE::default();
            let status = unsafe {
                RegQueryValueExW(
                    self.handle,
                    &name,
                    None,
                    Some(&mut kind as *mut REG_VALUE_TYPE),
                    Some(&mut value as *mut u32 as *mut u8),
                    Some(&mut size as *mut u32),
                )
            };
            if status != ERROR_SUCCESS {
                return Err(OsError::new("RegQueryValueExW", status.0));
            }
            Ok(value)
        }

        fn set_dword(&self, name: &str, value: u32) -> OsResult<()> {
            let name = HSTRING::from(name);
            let bytes = value.to_le_bytes();
            let status =
                unsafe { RegSetValueExW(self.handle, &name, Some(0), REG_DWORD, Some(&bytes)) };
            if status != ERROR_SUCCESS {
                return Err(OsError::new("RegSetValueExW", status.0));
            }
            Ok(())
        }
    }

    impl Drop for RegistryKey {
        fn drop(&mut self) {
            let status = unsafe { RegCloseKey(self.handle) };
            if status != ERROR_SUCCESS {
                error!("{}", OsError::new("Failed to close registry key", status.0));
            }
        }
    }
}
