//! The context object everything else drives: the task log with its file
//! store, the workday ledger, the saved window settings and the elapsed-time
//! formatter. The presentation layer is external and talks to [Tracker]
//! through the operations below; the daemon passes it into the tick handler.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::{
    tasklog::{store::TaskLogStore, TaskLog},
    utils::{clock::Clock, duration::DurationFormat, settings::WindowSettings},
    workday::WorkdayLedger,
};

pub const TASKS_FILE: &str = "tasks.json";
pub const WORKDAY_DB_FILE: &str = "workday.db";
pub const SETTINGS_FILE: &str = "settings.json";

/// Units used when presenting elapsed task time.
const ELAPSED_UNITS: &str = "dh";

pub struct Tracker {
    log: TaskLog,
    store: TaskLogStore,
    ledger: WorkdayLedger,
    settings: WindowSettings,
    settings_path: PathBuf,
    elapsed_format: DurationFormat,
}

impl Tracker {
    /// Loads all stores from `dir`. The ledger is built by the caller because
    /// only it knows whether this run should record a session boundary
    /// ([WorkdayLedger::open]) or just look around ([WorkdayLedger::attach]).
    pub async fn load(dir: &Path, ledger: WorkdayLedger, clock: Box<dyn Clock>) -> Result<Self> {
        let store = TaskLogStore::new(dir.join(TASKS_FILE));
        let log = store.load(clock).await?;
        let settings_path = dir.join(SETTINGS_FILE);
        let settings = WindowSettings::load(&settings_path)?;
        Ok(Self {
            log,
            store,
            ledger,
            settings,
            settings_path,
            elapsed_format: DurationFormat::new(ELAPSED_UNITS, true),
        })
    }

    pub fn log(&self) -> &TaskLog {
        &self.log
    }

    pub fn ledger(&self) -> &WorkdayLedger {
        &self.ledger
    }

    pub fn set_current_task(&mut self, name: &str) {
        self.log.add(Some(name));
    }

    pub fn mark_idle(&mut self) {
        self.log.add(None);
    }

    pub fn remove_task(&mut self, name: &str) {
        self.log.remove(name);
    }

    pub fn current_task_name(&self) -> Option<&str> {
        self.log.current_task_name()
    }

    pub fn active_task_names(&self) -> Vec<&str> {
        self.log.active_task_names()
    }

    pub fn elapsed_text(&self, name: &str) -> String {
        self.elapsed_format.format(self.log.duration_till_now(name))
    }

    /// The "copy elapsed time" operation. Returns the formatted duration for
    /// the clipboard (owned by the presentation layer) and folds the claimed
    /// seconds into the record, zeroing the task out of future totals.
    pub fn claim_elapsed(&mut self, name: &str) -> String {
        let elapsed = self.log.duration_till_now(name);
        self.log.adjust(name, elapsed);
        self.elapsed_format.format(elapsed)
    }

    pub fn keep_running(&self) -> bool {
        self.log.keep_running()
    }

    pub fn toggle_keep_running(&mut self) -> bool {
        let enabled = !self.log.keep_running();
        self.log.set_keep_running(enabled);
        enabled
    }

    pub fn set_keep_running(&mut self, enabled: bool) {
        self.log.set_keep_running(enabled);
    }

    /// Restart reconciliation, re-run on every unlock: see
    /// [TaskLog::continue_if_still_active].
    pub fn resume_if_still_active(&mut self) {
        self.log.continue_if_still_active();
    }

    pub async fn save(&mut self) -> Result<()> {
        self.store.save(&mut self.log).await
    }

    /// Shutdown sequence: persist the task log (closing idle marker per the
    /// keep-running rule), close the workday and write the settings back. Must
    /// run even on abrupt termination, a missing close corrupts the day's
    /// ledger for good.
    pub async fn finalize(&mut self) -> Result<()> {
        info!("Finalizing tracker state");
        self.store.save(&mut self.log).await?;
        self.ledger.close()?;
        self.settings.save(&self.settings_path)?;
        Ok(())
    }
}
