// The pairing core is only wired up on Windows.
#![cfg_attr(not(windows), allow(dead_code))]

mod domain;
mod error;
mod infrastructure;
mod presentation;

use domain::settings::SettingsService;
use infrastructure::logging::init_logger;
use std::path::PathBuf;
use tracing::{error, info, warn};

fn main() {
    // Every path exits with status 0; failures are reported on the console.
    if let Err(e) = run() {
        eprintln!("{:#}", e);
    }
}

fn run() -> anyhow::Result<()> {
    let settings = SettingsService::new().unwrap_or_else(|e| {
        eprintln!("{:#}; using settings.json in the working directory", e);
        SettingsService::from_path(PathBuf::from("settings.json"))
    });

    let _log_guard = init_logger(&settings.get().log_settings)?;
    info!("Starting Motion Controller pairing");

    if let Err(e) = settings.save_if_missing() {
        warn!("Could not write default settings to {}: {:#}", settings.path().display(), e);
    }

    pair_controllers(&settings)
}

#[cfg(windows)]
fn pair_controllers(settings: &SettingsService) -> anyhow::Result<()> {
    use domain::cancel::CancellationToken;
    use domain::timing::ThreadSleeper;
    use infrastructure::bluetooth::win32::Win32Bluetooth;
    use infrastructure::console::install_ctrl_c_handler;
    use infrastructure::registry::LocalMachineRegistry;
    use presentation::app::run_session;

    let cancel = CancellationToken::new();
    if let Err(e) = install_ctrl_c_handler(&cancel) {
        error!("Failed to install ctrl handler: {:#}", e);
        return Ok(());
    }

    let stdin = std::io::stdin();
    let end = run_session(
        &Win32Bluetooth,
        &LocalMachineRegistry,
        &ThreadSleeper,
        &settings.get().pairing,
        &cancel,
        &mut stdin.lock(),
        &mut std::io::stdout(),
    )?;
    info!("Session ended: {:?}", end);
    Ok(())
}

#[cfg(not(windows))]
fn pair_controllers(_settings: &SettingsService) -> anyhow::Result<()> {
    error!("Pairing motion controllers requires the Windows Bluetooth stack");
    Ok(())
}
