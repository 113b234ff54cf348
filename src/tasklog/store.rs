use std::{io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::utils::clock::Clock;

use super::{entities::TaskLogDocument, TaskLog};

/// File backed persistence for the task log.
///
/// A missing file yields a fresh empty log. Everything else that goes wrong is
/// surfaced: the log is the user's accounting data and silently discarding it
/// would defeat the point of keeping it.
pub struct TaskLogStore {
    path: PathBuf,
}

impl TaskLogStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads and reconciles the log: a still-active task behind a trailing
    /// idle marker resumes immediately.
    pub async fn load(&self, clock: Box<dyn Clock>) -> Result<TaskLog> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No task log at {:?}, starting empty", self.path);
                return Ok(TaskLog::new(clock));
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Can't read task log {}", self.path.display()))
            }
        };

        let document: TaskLogDocument = serde_json::from_slice(&raw)
            .with_context(|| format!("Task log {} is corrupted", self.path.display()))?;

        let mut log = document.into_log(clock);
        log.continue_if_still_active();
        Ok(log)
    }

    /// Applies the closing idle rule, then atomically replaces the file so a
    /// failed write can't leave a half-written store behind.
    pub async fn save(&self, log: &mut TaskLog) -> Result<()> {
        log.close_for_save();
        let body = serde_json::to_vec_pretty(&TaskLogDocument::from_log(log))?;

        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, &body)
            .await
            .with_context(|| format!("Can't write task log {}", staging.display()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("Can't replace task log {}", self.path.display()))?;
        Ok(())
    }
}
