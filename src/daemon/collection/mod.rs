pub mod collector;

use chrono::{DateTime, Local};

/// One poll of the workstation lock state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockSample {
    pub locked: bool,
    pub moment: DateTime<Local>,
}
