use anyhow::Result;
use tracing::{debug, info};

use crate::{daemon::collection::LockSample, daemon::session::SessionMonitor, tracker::Tracker};

use super::module::SampleProcessor;

/// Applies lock transitions to the tracker. On every transition the task log
/// is flushed to storage; coming back to active additionally resumes the
/// interrupted task and refreshes the keep-running indicator.
pub struct SessionSaver {
    tracker: Tracker,
    monitor: SessionMonitor,
}

impl SessionSaver {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            tracker,
            monitor: SessionMonitor::new(),
        }
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    #[cfg(test)]
    pub fn monitor(&self) -> &SessionMonitor {
        &self.monitor
    }
}

impl SampleProcessor for SessionSaver {
    async fn process_next(&mut self, sample: LockSample) -> Result<()> {
        if !self.monitor.observe(sample.locked) {
            if self.monitor.is_active() {
                // Elapsed time is only recomputed while the session is
                // active; a locked workstation has nothing to display.
                if let Some(current) = self.tracker.current_task_name() {
                    let current = current.to_owned();
                    debug!("Task {current} at {}", self.tracker.elapsed_text(&current));
                }
            }
            return Ok(());
        }

        info!(
            "Session became {}",
            if self.monitor.is_active() { "active" } else { "inactive" }
        );
        self.tracker.save().await?;
        if self.monitor.is_active() {
            self.tracker.resume_if_still_active();
            debug!("Keep running enabled: {}", self.tracker.keep_running());
        }
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        self.tracker.finalize().await
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        tasklog::{entities::TaskLogDocument, store::TaskLogStore},
        tracker::{Tracker, TASKS_FILE},
        utils::clock::{
            testing::{local, ManualClock},
            Clock,
        },
        workday::WorkdayLedger,
    };

    use super::*;

    fn sample(locked: bool, clock: &ManualClock) -> LockSample {
        LockSample {
            locked,
            moment: clock.now(),
        }
    }

    async fn saver_in(dir: &std::path::Path, clock: &ManualClock) -> Result<SessionSaver> {
        let ledger = WorkdayLedger::open_in_memory(true, Box::new(clock.clone()))?;
        let tracker = Tracker::load(dir, ledger, Box::new(clock.clone())).await?;
        Ok(SessionSaver::new(tracker))
    }

    #[tokio::test]
    async fn locking_saves_the_log_with_a_closing_idle_marker() -> Result<()> {
        let dir = tempdir()?;
        let clock = ManualClock::starting_at(local(2020, 2, 26, 8, 0, 0));
        let mut saver = saver_in(dir.path(), &clock).await?;
        saver.tracker.set_current_task("SDC-001");

        clock.set(local(2020, 2, 26, 9, 0, 0));
        saver.process_next(sample(false, &clock)).await?;
        // No transition, nothing written yet.
        assert!(!dir.path().join(TASKS_FILE).exists());

        clock.set(local(2020, 2, 26, 10, 0, 0));
        saver.process_next(sample(true, &clock)).await?;
        assert!(!saver.monitor().is_active());

        let raw = tokio::fs::read(dir.path().join(TASKS_FILE)).await?;
        let document: TaskLogDocument = serde_json::from_slice(&raw)?;
        assert_eq!(document.times.len(), 2);
        assert_eq!(document.times[1].name, None);
        assert_eq!(document.times[1].time, local(2020, 2, 26, 10, 0, 0));
        Ok(())
    }

    #[tokio::test]
    async fn unlocking_saves_and_resumes_the_task() -> Result<()> {
        let dir = tempdir()?;
        let clock = ManualClock::starting_at(local(2020, 2, 26, 8, 0, 0));
        let mut saver = saver_in(dir.path(), &clock).await?;
        saver.tracker.set_current_task("SDC-001");

        clock.set(local(2020, 2, 26, 10, 0, 0));
        saver.process_next(sample(true, &clock)).await?;

        clock.set(local(2020, 2, 26, 10, 45, 0));
        saver.process_next(sample(false, &clock)).await?;
        assert!(saver.monitor().is_active());

        let markers = saver.tracker().log().markers();
        let resumed = markers.last().unwrap();
        assert_eq!(resumed.task.as_deref(), Some("SDC-001"));
        assert_eq!(resumed.timestamp, local(2020, 2, 26, 10, 45, 0));
        // The locked stretch stays idle: the task is only credited again
        // from the unlock on.
        assert_eq!(
            saver.tracker().log().duration_for("SDC-001"),
            2. * 3600.
        );
        Ok(())
    }

    #[tokio::test]
    async fn keep_running_spans_the_locked_stretch() -> Result<()> {
        let dir = tempdir()?;
        let clock = ManualClock::starting_at(local(2020, 2, 26, 8, 0, 0));
        let mut saver = saver_in(dir.path(), &clock).await?;
        saver.tracker.set_current_task("SDC-001");
        saver.tracker.set_keep_running(true);

        clock.set(local(2020, 2, 26, 10, 0, 0));
        saver.process_next(sample(true, &clock)).await?;
        clock.set(local(2020, 2, 26, 10, 45, 0));
        saver.process_next(sample(false, &clock)).await?;

        // The lock-time save skipped its idle marker and consumed the flag,
        // so the locked stretch stays credited. The unlock-time save then
        // closed and immediately resumed the task at the same instant.
        let names: Vec<Option<&str>> = saver
            .tracker()
            .log()
            .markers()
            .iter()
            .map(|m| m.task.as_deref())
            .collect();
        assert_eq!(names, vec![Some("SDC-001"), None, Some("SDC-001")]);
        clock.set(local(2020, 2, 26, 11, 0, 0));
        assert_eq!(
            saver.tracker().log().duration_till_now("SDC-001"),
            3. * 3600.
        );
        Ok(())
    }

    #[tokio::test]
    async fn finalize_writes_log_and_workday_close() -> Result<()> {
        let dir = tempdir()?;
        let clock = ManualClock::starting_at(local(2020, 2, 26, 8, 0, 0));

        let ledger =
            WorkdayLedger::open(&dir.path().join("workday.db"), false, Box::new(clock.clone()))?;
        let tracker = Tracker::load(dir.path(), ledger, Box::new(clock.clone())).await?;
        let mut saver = SessionSaver::new(tracker);
        saver.tracker.set_current_task("SDC-001");

        // Shut down before the lunch cutoff so the closing event stays a
        // plain close instead of being picked up as a lunch boundary.
        clock.set(local(2020, 2, 26, 10, 30, 0));
        saver.finalize().await?;

        let store = TaskLogStore::new(dir.path().join(TASKS_FILE));
        let log = store.load(Box::new(clock.clone())).await?;
        assert_eq!(log.current_task_name(), Some("SDC-001"));

        let reopened = WorkdayLedger::attach(&dir.path().join("workday.db"), Box::new(clock))?;
        assert_eq!(
            reopened.work_duration_for_day(local(2020, 2, 26, 0, 0, 0).date_naive())?,
            chrono::Duration::minutes(150)
        );
        Ok(())
    }
}
