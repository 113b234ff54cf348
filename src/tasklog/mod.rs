//! The per-task accounting engine. A task log is a registry of task names plus
//! an append-only sequence of timestamped markers recording which task became
//! current (or that the user went idle). Durations are derived from marker
//! gaps, so nothing has to tick while the process is alive or even running.

pub mod entities;
pub mod store;

use chrono::{DateTime, Local};

use crate::utils::clock::Clock;

/// Registry entry for a task name. Records are soft-deleted only, so markers
/// referring to old tasks stay attributable.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub name: String,
    /// Seconds already claimed out of the totals, subtracted from every derived
    /// duration.
    pub reported_time: f64,
    pub active: bool,
}

impl TaskRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            reported_time: 0.,
            active: true,
        }
    }
}

/// A timestamped "this became current" entry. `task == None` marks idle.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub task: Option<String>,
    pub timestamp: DateTime<Local>,
}

pub struct TaskLog {
    tasks: Vec<TaskRecord>,
    markers: Vec<Marker>,
    /// When set, the next save skips the closing idle marker so the log reads
    /// as if the task never stopped. Consumed by the save.
    keep_running: bool,
    clock: Box<dyn Clock>,
}

impl TaskLog {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            tasks: vec![],
            markers: vec![],
            keep_running: false,
            clock,
        }
    }

    pub(crate) fn from_parts(
        tasks: Vec<TaskRecord>,
        markers: Vec<Marker>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            markers,
            keep_running: false,
            clock,
        }
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn find(&self, name: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|record| record.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut TaskRecord> {
        self.tasks.iter_mut().find(|record| record.name == name)
    }

    /// Registers the task on first mention and appends a marker stamped "now".
    /// This is the only way markers enter the log. Consecutive identical
    /// markers are allowed, history is never rewritten.
    pub fn add(&mut self, task: Option<&str>) {
        if let Some(name) = task {
            if self.find(name).is_none() {
                self.tasks.push(TaskRecord::new(name));
            }
        }
        self.markers.push(Marker {
            task: task.map(str::to_owned),
            timestamp: self.clock.now(),
        });
    }

    /// Soft delete. Markers are untouched so past durations stay computable.
    pub fn remove(&mut self, name: &str) {
        if let Some(record) = self.find_mut(name) {
            record.active = false;
        }
    }

    /// Name of the task the last non-idle marker points at, provided its record
    /// is still active. The backward scan stops at the first non-idle marker:
    /// trailing idle markers only mean nothing is being timed right now.
    pub fn current_task_name(&self) -> Option<&str> {
        let marker = self.markers.iter().rev().find(|marker| marker.task.is_some())?;
        let name = marker.task.as_deref()?;
        self.find(name)
            .filter(|record| record.active)
            .map(|record| record.name.as_str())
    }

    /// Active task names in registration order.
    pub fn active_task_names(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|record| record.active)
            .map(|record| record.name.as_str())
            .collect()
    }

    /// Total seconds attributed to `name`: every marker gap that begins with
    /// the task counts, whatever it transitions into, minus the already
    /// reported time. Gaps beginning with idle are never credited.
    pub fn duration_for(&self, name: &str) -> f64 {
        let mut total = -self.find(name).map(|record| record.reported_time).unwrap_or(0.);
        for pair in self.markers.windows(2) {
            if pair[0].task.as_deref() == Some(name) {
                total += (pair[1].timestamp - pair[0].timestamp).num_seconds() as f64;
            }
        }
        total
    }

    /// [duration_for](Self::duration_for) plus the still-open gap from the last
    /// marker to now, counted only while that marker actually is the task.
    pub fn duration_till_now(&self, name: &str) -> f64 {
        let mut total = self.duration_for(name);
        if let Some(last) = self.markers.last() {
            if last.task.as_deref() == Some(name) {
                total += (self.clock.now() - last.timestamp).num_milliseconds() as f64 / 1000.;
            }
        }
        total
    }

    /// Folds claimed seconds into the record so future totals exclude them.
    /// A no-op for unknown names.
    pub fn adjust(&mut self, name: &str, delta_seconds: f64) {
        if let Some(record) = self.find_mut(name) {
            record.reported_time += delta_seconds;
        }
    }

    /// Restart reconciliation: a trailing idle marker while the current task is
    /// still active means the process shut down mid-task, so timing resumes
    /// with a fresh marker instead of charging the downtime as idle.
    pub fn continue_if_still_active(&mut self) {
        let Some(current) = self.current_task_name().map(str::to_owned) else {
            return;
        };
        if matches!(self.markers.last(), Some(marker) if marker.task.is_none()) {
            self.add(Some(&current));
        }
    }

    pub fn keep_running(&self) -> bool {
        self.keep_running
    }

    pub fn set_keep_running(&mut self, keep_running: bool) {
        self.keep_running = keep_running;
    }

    /// Save-time rule: append the closing idle marker unless keep-running was
    /// requested. The flag only lives until the next save.
    pub(crate) fn close_for_save(&mut self) {
        if self.keep_running {
            self.keep_running = false;
        } else {
            self.add(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::testing::{local, ManualClock};

    fn log_with(clock: &ManualClock) -> TaskLog {
        TaskLog::new(Box::new(clock.clone()))
    }

    /// Marker history used by most duration tests:
    /// SDC-001 07:43, idle 11:21:30, SDC-002 11:50:45, idle 16:42:30,
    /// then next day SDC-002 07:10, SDC-001 09:55.
    fn two_day_log(clock: &ManualClock) -> TaskLog {
        let mut log = log_with(clock);
        clock.set(local(2020, 2, 26, 7, 43, 0));
        log.add(Some("SDC-001"));
        clock.set(local(2020, 2, 26, 11, 21, 30));
        log.add(None);
        clock.set(local(2020, 2, 26, 11, 50, 45));
        log.add(Some("SDC-002"));
        clock.set(local(2020, 2, 26, 16, 42, 30));
        log.add(None);
        clock.set(local(2020, 2, 27, 7, 10, 0));
        log.add(Some("SDC-002"));
        clock.set(local(2020, 2, 27, 9, 55, 0));
        log.add(Some("SDC-001"));
        log.adjust("SDC-001", 15000.);
        log.remove("SDC-002");
        log
    }

    #[test]
    fn add_registers_once_and_always_appends_markers() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 7, 43, 0));
        let mut log = log_with(&clock);
        log.add(Some("SDC-011"));
        clock.set(local(2020, 2, 26, 9, 11, 0));
        log.add(None);
        clock.set(local(2020, 2, 26, 9, 16, 0));
        log.add(Some("SDC-011"));

        assert_eq!(log.tasks().len(), 1);
        assert_eq!(log.tasks()[0].name, "SDC-011");
        assert_eq!(log.tasks()[0].reported_time, 0.);
        assert!(log.tasks()[0].active);

        let names: Vec<Option<&str>> =
            log.markers().iter().map(|m| m.task.as_deref()).collect();
        assert_eq!(names, vec![Some("SDC-011"), None, Some("SDC-011")]);
        assert_eq!(log.markers()[1].timestamp, local(2020, 2, 26, 9, 11, 0));
    }

    #[test]
    fn remove_only_flips_the_active_flag() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 7, 43, 0));
        let mut log = two_day_log(&clock);
        let markers_before = log.markers().len();

        log.remove("SDC-003");
        log.remove("SDC-001");

        assert_eq!(log.tasks().len(), 2);
        assert!(!log.tasks()[0].active);
        assert!(!log.tasks()[1].active);
        assert_eq!(log.markers().len(), markers_before);
    }

    #[test]
    fn current_task_skips_trailing_idle_markers() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 7, 43, 0));
        let mut log = log_with(&clock);
        log.add(Some("SDC-001"));
        clock.set(local(2020, 2, 26, 11, 21, 30));
        log.add(None);

        assert_eq!(log.current_task_name(), Some("SDC-001"));
    }

    #[test]
    fn current_task_of_a_removed_record_is_nothing() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 7, 43, 0));
        let mut log = two_day_log(&clock);
        assert_eq!(log.current_task_name(), Some("SDC-001"));
        log.remove("SDC-001");
        assert_eq!(log.current_task_name(), None);
    }

    #[test]
    fn current_task_stops_at_first_non_idle_marker() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 7, 43, 0));
        let mut log = log_with(&clock);
        log.add(Some("SDC-001"));
        log.add(Some("SDC-002"));
        log.remove("SDC-002");
        log.add(None);

        // SDC-001 is still active but the scan must not look past SDC-002.
        assert_eq!(log.current_task_name(), None);
    }

    #[test]
    fn active_names_keep_registration_order() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 7, 43, 0));
        let mut log = log_with(&clock);
        log.add(Some("SDC-001"));
        log.add(Some("SDC-002"));
        log.add(Some("SDC-005"));
        log.remove("SDC-002");

        assert_eq!(log.active_task_names(), vec!["SDC-001", "SDC-005"]);
    }

    #[test]
    fn durations_sum_gaps_that_begin_with_the_task() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 7, 43, 0));
        let log = two_day_log(&clock);

        // 07:43:00 -> 11:21:30 minus the 15000s already reported.
        assert_eq!(log.duration_for("SDC-001"), 13110. - 15000.);
        // 11:50:45 -> 16:42:30 plus 07:10:00 -> 09:55:00. The idle gap in
        // between is not credited, and removal doesn't hide history.
        assert_eq!(log.duration_for("SDC-002"), 17505. + 9900.);
        assert_eq!(log.duration_for("SDC-003"), 0.);
    }

    #[test]
    fn idle_markers_never_merge_intervals() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 8, 0, 0));
        let mut log = log_with(&clock);
        log.add(Some("SDC-009"));
        clock.set(local(2020, 2, 26, 9, 0, 0));
        log.add(None);
        clock.set(local(2020, 2, 26, 10, 0, 0));
        log.add(Some("SDC-009"));
        clock.set(local(2020, 2, 26, 10, 30, 0));
        log.add(None);

        // 1h + 30m, not the whole 2h30m span.
        assert_eq!(log.duration_for("SDC-009"), 5400.);
    }

    #[test]
    fn open_gap_counts_only_for_the_last_marker_task() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 8, 0, 0));
        let mut log = log_with(&clock);
        log.add(Some("SDC-001"));
        clock.set(local(2020, 2, 26, 14, 0, 0));
        log.add(Some("SDC-002"));
        clock.set(local(2020, 2, 26, 18, 0, 0));

        assert_eq!(log.duration_till_now("SDC-001"), 6. * 3600.);
        assert_eq!(log.duration_till_now("SDC-002"), 4. * 3600.);
    }

    #[test]
    fn adjust_accumulates_and_ignores_unknown_names() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 8, 0, 0));
        let mut log = log_with(&clock);
        log.add(Some("SDC-001"));
        log.adjust("SDC-001", 600.);
        log.adjust("SDC-001", 300.);
        log.adjust("SDC-XXX", 5000.);

        assert_eq!(log.find("SDC-001").unwrap().reported_time, 900.);
        assert_eq!(log.tasks().len(), 1);
    }

    #[test]
    fn reconciliation_resumes_an_interrupted_task() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 11, 21, 30));
        let mut log = log_with(&clock);
        log.add(Some("SDC-002"));
        clock.set(local(2020, 2, 26, 11, 50, 45));
        log.add(None);

        clock.set(local(2020, 2, 26, 15, 32, 0));
        log.continue_if_still_active();

        let last = log.markers().last().unwrap();
        assert_eq!(last.task.as_deref(), Some("SDC-002"));
        assert_eq!(last.timestamp, local(2020, 2, 26, 15, 32, 0));
    }

    #[test]
    fn reconciliation_is_a_no_op_without_a_trailing_idle() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 11, 21, 30));
        let mut log = log_with(&clock);
        log.add(Some("SDC-002"));
        log.continue_if_still_active();
        assert_eq!(log.markers().len(), 1);
    }

    #[test]
    fn reconciliation_leaves_removed_tasks_idle() {
        let clock = ManualClock::starting_at(local(2020, 2, 26, 11, 21, 30));
        let mut log = log_with(&clock);
        log.add(Some("SDC-002"));
        log.remove("SDC-002");
        log.add(None);
        log.continue_if_still_active();
        assert_eq!(log.markers().len(), 2);
    }

    #[test]
    fn save_appends_idle_unless_keep_running_was_requested() {
        let clock = ManualClock::starting_at(local(2020, 2, 25, 18, 43, 0));
        let mut log = log_with(&clock);
        log.add(Some("SDC-007"));

        log.set_keep_running(true);
        log.close_for_save();
        assert_eq!(log.markers().len(), 1);
        assert!(!log.keep_running());

        log.close_for_save();
        assert_eq!(log.markers().len(), 2);
        assert!(log.markers().last().unwrap().task.is_none());
    }
}
