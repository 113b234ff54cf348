//! Contains logic for querying the workstation lock state in different
//! environments. [GenericSessionSignal] is the main artifact of this module
//! that abstracts the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use anyhow::Result;

/// Contract windows and linux systems must implement: answer whether the
/// workstation is currently locked, once per poll tick.
#[cfg_attr(test, mockall::automock)]
pub trait SessionSignal: Send {
    fn is_locked(&mut self) -> Result<bool>;
}

/// Serves as a cross-compatible SessionSignal implementation.
pub struct GenericSessionSignal {
    inner: Box<dyn SessionSignal>,
}

impl GenericSessionSignal {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsSessionSignal;
                Ok(Self {
                    inner: Box::new(WindowsSessionSignal::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::X11SessionSignal;
                Ok(Self {
                    inner: Box::new(X11SessionSignal::new()?),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No lock probe was specified")
            }
        }
    }
}

impl SessionSignal for GenericSessionSignal {
    fn is_locked(&mut self) -> Result<bool> {
        self.inner.is_locked()
    }
}
