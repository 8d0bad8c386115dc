use crate::domain::cancel::CancellationToken;
use crate::domain::controller::ControllerClassifier;
use crate::domain::settings::PairingSettings;
use crate::domain::timing::Sleeper;
use crate::infrastructure::bluetooth::pairing::{Pairer, PairingPolicy};
use crate::infrastructure::bluetooth::radio::{close_all, list_radios, prepare_radio};
use crate::infrastructure::bluetooth::BluetoothApi;
use crate::infrastructure::registry::ConfigStore;
use crate::presentation::console::{choose_radio, print_radios};
use std::io::{BufRead, Write};
use tracing::{error, info};

/// Why a pairing session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    NoRadios,
    RadioNotReady,
    Cancelled,
    RadioLost,
}

/// One operator session: pick a radio, ready it, and pair controllers until
/// cancelled. Radios are released on every path out.
pub fn run_session<B, S, T, R, W>(
    api: &B,
    store: &S,
    sleeper: &T,
    pairing: &PairingSettings,
    cancel: &CancellationToken,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<SessionEnd>
where
    B: BluetoothApi,
    S: ConfigStore,
    T: Sleeper,
    R: BufRead,
    W: Write,
{
    writeln!(out, "==== Looking for Bluetooth radios ====\n")?;

    let radios = list_radios(api);
    if radios.is_empty() {
        writeln!(out, "No Bluetooth radios found.")?;
        return Ok(SessionEnd::NoRadios);
    }

    let end = pair_on_chosen_radio(api, store, sleeper, pairing, cancel, &radios, input, out);
    close_all(radios);
    end
}

#[allow(clippy::too_many_arguments)]
fn pair_on_chosen_radio<B, S, T, R, W>(
    api: &B,
    store: &S,
    sleeper: &T,
    pairing: &PairingSettings,
    cancel: &CancellationToken,
    radios: &[B::Radio],
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<SessionEnd>
where
    B: BluetoothApi,
    S: ConfigStore,
    T: Sleeper,
    R: BufRead,
    W: Write,
{
    print_radios(api, radios, out)?;
    let radio = &radios[choose_radio(radios.len(), input, out)?];

    if !prepare_radio(api, radio) {
        error!("Failed to configure Bluetooth radio for use");
        return Ok(SessionEnd::RadioNotReady);
    }

    writeln!(out, "\n\n==== Connecting new controllers ====\n")?;
    out.flush()?;

    let pairer = Pairer::new(
        api,
        store,
        sleeper,
        radio,
        ControllerClassifier::new(pairing.target_device_name.clone()),
        PairingPolicy::from_settings(pairing),
    );

    match pairer.run(cancel) {
        Ok(()) => {
            info!("Pairing stopped by operator");
            Ok(SessionEnd::Cancelled)
        }
        Err(e) => {
            error!("{}", e);
            Ok(SessionEnd::RadioLost)
        }
    }
}
