//! Operator console: radio listing and selection.

use crate::infrastructure::bluetooth::BluetoothApi;
use std::io::{self, BufRead, Write};
use tracing::error;

/// Print one line per radio: index, address and name.
pub fn print_radios<B: BluetoothApi, W: Write>(
    api: &B,
    radios: &[B::Radio],
    out: &mut W,
) -> io::Result<()> {
    for (index, radio) in radios.iter().enumerate() {
        match api.radio_info(radio) {
            Ok(info) => writeln!(out, "  ({})  {}  {}", index, info.address, info.name)?,
            Err(e) => {
                writeln!(out, "  ({})  <unknown>", index)?;
                error!("{}", e.with_context("Failed to retrieve Bluetooth radio info"));
            }
        }
    }
    writeln!(out)
}

/// Pick a radio index. A single radio is used without asking; otherwise the
/// operator is prompted until a listed index is entered.
pub fn choose_radio<R: BufRead, W: Write>(
    count: usize,
    input: &mut R,
    out: &mut W,
) -> io::Result<usize> {
    if count <= 1 {
        writeln!(out, "Using the only available Bluetooth radio.")?;
        return Ok(0);
    }

    let mut line = String::new();
    loop {
        write!(out, "Choose one of the listed Bluetooth radios by number: ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no radio selected",
            ));
        }

        match line.trim().parse::<usize>() {
            Ok(index) if index < count => return Ok(index),
            _ => continue,
        }
    }
}
