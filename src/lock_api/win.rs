use anyhow::Result;
use tracing::debug;
use windows::Win32::System::StationsAndDesktops::{
    CloseDesktop, OpenInputDesktop, SwitchDesktop, DESKTOP_CONTROL_FLAGS, DESKTOP_SWITCHDESKTOP,
};

use super::SessionSignal;

pub struct WindowsSessionSignal;

impl WindowsSessionSignal {
    pub fn new() -> Self {
        Self
    }
}

impl SessionSignal for WindowsSessionSignal {
    fn is_locked(&mut self) -> Result<bool> {
        // While the secure desktop is up the input desktop either refuses to
        // open or refuses SwitchDesktop. Windows has no direct lock query.
        let desktop = match unsafe {
            OpenInputDesktop(DESKTOP_CONTROL_FLAGS(0), false, DESKTOP_SWITCHDESKTOP)
        } {
            Ok(desktop) => desktop,
            Err(e) => {
                debug!("OpenInputDesktop failed, treating as locked {e:?}");
                return Ok(true);
            }
        };

        let locked = unsafe { SwitchDesktop(desktop) }.is_err();
        if let Err(e) = unsafe { CloseDesktop(desktop) } {
            debug!("Failed to close desktop handle {e:?}");
        }
        Ok(locked)
    }
}
