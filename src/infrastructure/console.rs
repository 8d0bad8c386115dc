//! Console control handling
//!
//! Ctrl-C only requests a stop through the shared `CancellationToken`; the
//! scan loop notices it at the start of its next cycle.

use crate::domain::cancel::CancellationToken;
use std::sync::OnceLock;

static STOP_REQUEST: OnceLock<CancellationToken> = OnceLock::new();

fn request_stop() -> bool {
    match STOP_REQUEST.get() {
        Some(token) => {
            token.cancel();
            true
        }
        None => false,
    }
}

#[cfg(windows)]
pub fn install_ctrl_c_handler(token: &CancellationToken) -> anyhow::Result<()> {
    use windows::Win32::System::Console::SetConsoleCtrlHandler;

    STOP_REQUEST
        .set(token.clone())
        .map_err(|_| anyhow::anyhow!("Ctrl-C handler already installed"))?;
    unsafe { SetConsoleCtrlHandler(Some(ctrl_handler), true) }?;
    tracing::debug!("Ctrl-C handler installed");
    Ok(())
}

#[cfg(windows)]
unsafe extern "system" fn ctrl_handler(ctrl_type: u32) -> windows::core::BOOL {
    use windows::Win32::System::Console::CTRL_C_EVENT;

    if ctrl_type == CTRL_C_EVENT {
        request_stop().into()
    } else {
        false.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_request_reaches_token() {
        let token = CancellationToken::new();
        // Another test may have registered first; either way the registered
        // token must observe the request.
        let _ = STOP_REQUEST.set(token.clone());
        assert!(request_stop());
        assert!(STOP_REQUEST.get().unwrap().is_cancelled());
    }
}
