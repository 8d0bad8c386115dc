use crate::domain::controller::MOTION_CONTROLLER_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_false")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_false(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "move_pair".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Pairing policy knobs. Defaults were tuned against one controller firmware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingSettings {
    #[serde(default = "default_target_device_name")]
    pub target_device_name: String,
    #[serde(default = "default_connection_retries")]
    pub connection_retries: u32,
    #[serde(default = "default_connection_retry_delay_ms")]
    pub connection_retry_delay_ms: u64,
    #[serde(default = "default_verify_samples")]
    pub verify_samples: u32,
    #[serde(default = "default_verify_sample_delay_ms")]
    pub verify_sample_delay_ms: u64,
    #[serde(default = "default_inquiry_every_n_scans")]
    pub inquiry_every_n_scans: u32,
    // Units of 1.28 seconds, 1..=48
    #[serde(default = "default_inquiry_timeout_multiplier")]
    pub inquiry_timeout_multiplier: u8,
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            target_device_name: default_target_device_name(),
            connection_retries: default_connection_retries(),
            connection_retry_delay_ms: default_connection_retry_delay_ms(),
            verify_samples: default_verify_samples(),
            verify_sample_delay_ms: default_verify_sample_delay_ms(),
            inquiry_every_n_scans: default_inquiry_every_n_scans(),
            inquiry_timeout_multiplier: default_inquiry_timeout_multiplier(),
            scan_interval_ms: default_scan_interval_ms(),
        }
    }
}

fn default_target_device_name() -> String {
    MOTION_CONTROLLER_NAME.to_string()
}
fn default_connection_retries() -> u32 {
    80
}
fn default_connection_retry_delay_ms() -> u64 {
    300
}
fn default_verify_samples() -> u32 {
    5
}
fn default_verify_sample_delay_ms() -> u64 {
    300
}
fn default_inquiry_every_n_scans() -> u32 {
    5
}
fn default_inquiry_timeout_multiplier() -> u8 {
    1
}

/// Slightly longer than one inquiry window so a scan finishes before the next.
pub fn scan_interval_for(timeout_multiplier: u8) -> u64 {
    (timeout_multiplier as f64 * 1280.0 * 1.1) as u64
}

fn default_scan_interval_ms() -> u64 {
    scan_interval_for(default_inquiry_timeout_multiplier())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pairing: PairingSettings,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
    loaded_from_disk: bool,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::from_path(settings_path))
    }

    /// Load from an explicit path, falling back to defaults on a missing or
    /// unreadable file.
    pub fn from_path(settings_path: PathBuf) -> Self {
        let loaded = Self::load_from_file(&settings_path).ok();
        let loaded_from_disk = loaded.is_some();
        Self {
            settings: loaded.unwrap_or_default(),
            settings_path,
            loaded_from_disk,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("MovePair");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    /// Write the defaults out once so the operator has a file to edit.
    pub fn save_if_missing(&self) -> anyhow::Result<()> {
        if self.loaded_from_disk || self.settings_path.exists() {
            return Ok(());
        }
        self.save()
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }
}
