use thiserror::Error;

/// Win32 `ERROR_INVALID_HANDLE`
pub const ERROR_INVALID_HANDLE: u32 = 6;
/// Win32 `ERROR_NO_MORE_ITEMS`
pub const ERROR_NO_MORE_ITEMS: u32 = 259;
/// Win32 `ERROR_MORE_DATA`
pub const ERROR_MORE_DATA: u32 = 234;
/// Win32 `ERROR_DEVICE_NOT_CONNECTED`
pub const ERROR_DEVICE_NOT_CONNECTED: u32 = 1167;

/// A failed OS call, carrying the raw status code and the system text for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[ERROR {code:#010x}] {context}: {message}")]
pub struct OsError {
    pub context: String,
    pub code: u32,
    pub message: String,
}

impl OsError {
    pub fn new(context: impl Into<String>, code: u32) -> Self {
        Self {
            context: context.into(),
            code,
            message: system_message(code),
        }
    }

    /// Replace the low-level context (usually the API name) with what the
    /// caller was trying to do.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// The radio itself went away; scanning it again cannot succeed.
    pub fn is_radio_lost(&self) -> bool {
        matches!(self.code, ERROR_INVALID_HANDLE | ERROR_DEVICE_NOT_CONNECTED)
    }
}

#[cfg(windows)]
fn system_message(code: u32) -> String {
    windows::core::HRESULT::from_win32(code)
        .message()
        .trim_end()
        .to_string()
}

#[cfg(not(windows))]
fn system_message(code: u32) -> String {
    format!("OS error {}", code)
}

pub type OsResult<T> = std::result::Result<T, OsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let err = OsError {
            context: "Failed to enable HID service".to_string(),
            code: 0x57,
            message: "The parameter is incorrect.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "[ERROR 0x00000057] Failed to enable HID service: The parameter is incorrect."
        );
    }

    #[test]
    fn test_radio_lost_classification() {
        assert!(OsError::new("enum", ERROR_INVALID_HANDLE).is_radio_lost());
        assert!(OsError::new("enum", ERROR_DEVICE_NOT_CONNECTED).is_radio_lost());
        assert!(!OsError::new("enum", ERROR_MORE_DATA).is_radio_lost());
    }
}
