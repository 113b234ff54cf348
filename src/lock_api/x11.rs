use anyhow::{anyhow, Result};
use xcb::{
    screensaver::{QueryInfo, State},
    x::{Drawable, Window},
    Connection,
};

use super::SessionSignal;

/// Treats an active screen saver as "locked". X11 has no portable lock query,
/// and on sessions configured to lock with the saver the two coincide.
pub struct X11SessionSignal {
    connection: Connection,
    root: Window,
}

impl X11SessionSignal {
    pub fn new() -> Result<Self> {
        let (connection, screen_num) = Connection::connect(None)?;
        let root = {
            let setup = connection.get_setup();
            let screen = setup
                .roots()
                .nth(screen_num as usize)
                .ok_or_else(|| anyhow!("Couldn't find screen {screen_num}"))?;
            screen.root()
        };
        Ok(Self { connection, root })
    }
}

impl SessionSignal for X11SessionSignal {
    fn is_locked(&mut self) -> Result<bool> {
        let reply = self.connection.wait_for_reply(self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(self.root),
        }))?;
        Ok(reply.state() == State::On as u8)
    }
}
