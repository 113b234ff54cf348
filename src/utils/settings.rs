use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Window placement remembered between runs. The geometry string has the form
/// `"+<x>+<y>"` and is produced/consumed by the presentation layer; this module
/// only persists it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl WindowSettings {
    /// A missing file is not an error, the defaults apply on first run.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Can't read settings {}", path.display()))
            }
        };
        serde_json::from_slice(&raw)
            .with_context(|| format!("Settings file {} is corrupted", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, body)
            .with_context(|| format!("Can't write settings {}", path.display()))
    }
}
