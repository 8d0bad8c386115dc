use std::fmt;

/// Bluetooth hardware address, stored least significant byte first the way
/// the OS hands it over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BluetoothAddress(pub [u8; 6]);

impl BluetoothAddress {
    pub fn as_u64(&self) -> u64 {
        let b = self.0;
        u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], 0, 0])
    }

    /// Twelve lowercase hex digits, most significant byte first, no separators.
    pub fn to_registry_hex(&self) -> String {
        self.0.iter().rev().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

/// Snapshot of one remote device as reported by the OS at query time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceRecord {
    pub address: BluetoothAddress,
    pub name: String,
    pub class_of_device: u32,
    pub connected: bool,
    pub remembered: bool,
    pub authenticated: bool,
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  CoD: {:#010x}, CON: {}, REM: {}, AUTH: {}",
            self.address,
            self.name,
            self.class_of_device,
            self.connected as u8,
            self.remembered as u8,
            self.authenticated as u8
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RadioInfo {
    pub address: BluetoothAddress,
    pub name: String,
}

/// Parameters for one device enumeration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceQuery {
    /// Inquiry window in units of 1.28 seconds
    pub timeout_multiplier: u8,
    pub issue_inquiry: bool,
    pub return_authenticated: bool,
    pub return_connected: bool,
    pub return_remembered: bool,
    pub return_unknown: bool,
}

impl DeviceQuery {
    /// Every class of device the OS knows about, optionally scanning the air first.
    pub fn everything(timeout_multiplier: u8, issue_inquiry: bool) -> Self {
        Self {
            timeout_multiplier,
            issue_inquiry,
            return_authenticated: true,
            return_connected: true,
            return_remembered: true,
            return_unknown: true,
        }
    }
}

/// How the pairing protocol ended for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingOutcome {
    /// Stable connection verified on the given retry iteration
    Confirmed { attempts: u32 },
    /// Never connected; the OS was told to forget the device
    Removed { attempts: u32 },
    /// Gave up without confirmation, device record left in place
    Unconfirmed { attempts: u32 },
}

impl PairingOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Confirmed { attempts }
            | Self::Removed { attempts }
            | Self::Unconfirmed { attempts } => *attempts,
        }
    }
}
