//! The workday accounting engine. Separate from the task log on purpose: it
//! answers "how long did I work today and how long was lunch" from a global
//! open/close event ledger, with rules (consecutive dedup, lunch retagging)
//! that have nothing to do with per-task markers.

use std::fmt::Display;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::utils::{
    clock::Clock,
    time::{day_key, format_event_time, parse_event_time},
};

/// Kinds of ledger rows. A lunch row starts its life as a close and is
/// retagged by the detection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Open,
    Close,
    Lunch,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Open => "open",
            EventKind::Close => "close",
            EventKind::Lunch => "lunch",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events at or after this local wall-clock time can mark a lunch break.
const LUNCH_CUTOFF: &str = "11:00:00";

/// Append-only event ledger backed by a single sqlite table
/// `Event(id TEXT, time TEXT)`, created lazily.
pub struct WorkdayLedger {
    conn: Connection,
    clock: Box<dyn Clock>,
}

impl WorkdayLedger {
    /// Opens the ledger and records the session boundary: `open` for an
    /// interactive start, `close` when starting in background mode. Both go
    /// through the consecutive-dedup rule, so a brand new ledger opened in
    /// background mode stays empty.
    pub fn open(path: &Path, background: bool, clock: Box<dyn Clock>) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Can't open event ledger {}", path.display()))?;
        Self::init(conn, background, clock)
    }

    /// Opens the ledger without recording any event. Used by read-mostly
    /// callers like the status report, which must not disturb the day's
    /// open/close sequence.
    pub fn attach(path: &Path, clock: Box<dyn Clock>) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Can't open event ledger {}", path.display()))?;
        Self::create_table(&conn)?;
        Ok(Self { conn, clock })
    }

    pub fn open_in_memory(background: bool, clock: Box<dyn Clock>) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, background, clock)
    }

    fn init(conn: Connection, background: bool, clock: Box<dyn Clock>) -> Result<Self> {
        Self::create_table(&conn)?;
        let mut ledger = Self { conn, clock };
        ledger.record_event(if background {
            EventKind::Close
        } else {
            EventKind::Open
        })?;
        Ok(ledger)
    }

    fn create_table(conn: &Connection) -> Result<()> {
        conn.execute("CREATE TABLE IF NOT EXISTS Event (id TEXT, time TEXT)", [])?;
        Ok(())
    }

    /// Appends an event stamped "now" unless the ledger already ends in the
    /// same kind (an empty ledger counts as ending in `close`). The append and
    /// any lunch retag it triggers commit together.
    pub fn record_event(&mut self, kind: EventKind) -> Result<()> {
        let now = self.clock.now().naive_local();
        let tx = self.conn.transaction()?;

        let last_kind: Option<String> = tx
            .query_row(
                "SELECT id FROM Event ORDER BY time DESC, rowid DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        if last_kind.as_deref().unwrap_or("close") != kind.as_str() {
            tx.execute(
                "INSERT INTO Event (id, time) VALUES (?1, ?2)",
                params![kind.as_str(), format_event_time(now)],
            )?;
            detect_and_tag_lunch(&tx, now.date())?;
        } else {
            debug!("Skipping duplicate {kind} event");
        }

        tx.commit()?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.record_event(EventKind::Close)
    }

    /// Worked time of the current day. The day and its end are taken from the
    /// latest event when it is a close, otherwise the day is still running and
    /// ends "now".
    pub fn todays_work_duration(&self) -> Result<Duration> {
        let last: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT id, time FROM Event ORDER BY time DESC, rowid DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let end = match &last {
            Some((kind, time)) if kind == "close" => parse_event_time(time)?,
            _ => self.clock.now().naive_local(),
        };
        self.work_until(end.date(), end)
    }

    /// Worked time of a finished day: earliest non-close event to latest
    /// close. Zero when either end is missing.
    pub fn work_duration_for_day(&self, day: NaiveDate) -> Result<Duration> {
        let end: Option<String> = self
            .conn
            .query_row(
                "SELECT time FROM Event WHERE date(time) = ?1 AND id = 'close'
                 ORDER BY time DESC, rowid DESC LIMIT 1",
                params![day_key(day)],
                |row| row.get(0),
            )
            .optional()?;
        match end {
            Some(end) => self.work_until(day, parse_event_time(&end)?),
            None => Ok(Duration::zero()),
        }
    }

    fn work_until(&self, day: NaiveDate, end: NaiveDateTime) -> Result<Duration> {
        let start: Option<String> = self
            .conn
            .query_row(
                "SELECT time FROM Event WHERE date(time) = ?1 AND id != 'close'
                 ORDER BY time ASC, rowid ASC LIMIT 1",
                params![day_key(day)],
                |row| row.get(0),
            )
            .optional()?;
        match start {
            Some(start) => Ok(end - parse_event_time(&start)?),
            None => Ok(Duration::zero()),
        }
    }

    /// Lunch length of a day: from its earliest lunch event to the next event
    /// of any kind. Zero while the lunch is unpaired or absent.
    pub fn lunch_duration(&self, day: NaiveDate) -> Result<Duration> {
        let lunch: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT time, rowid FROM Event WHERE date(time) = ?1 AND id = 'lunch'
                 ORDER BY time ASC, rowid ASC LIMIT 1",
                params![day_key(day)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((lunch_time, lunch_row)) = lunch else {
            return Ok(Duration::zero());
        };

        let next: Option<String> = self
            .conn
            .query_row(
                "SELECT time FROM Event WHERE date(time) = ?1
                 AND (time > ?2 OR (time = ?2 AND rowid > ?3))
                 ORDER BY time ASC, rowid ASC LIMIT 1",
                params![day_key(day), lunch_time, lunch_row],
                |row| row.get(0),
            )
            .optional()?;
        match next {
            Some(next) => Ok(parse_event_time(&next)? - parse_event_time(&lunch_time)?),
            None => Ok(Duration::zero()),
        }
    }

    pub fn todays_lunch_duration(&self) -> Result<Duration> {
        self.lunch_duration(self.clock.now().date_naive())
    }
}

/// The lunch heuristic: the close event bracketing the 11:00 cutoff is assumed
/// to be a lunch break rather than a day-end close, and is retagged in place.
/// At most one row changes per call and reapplying it is a no-op.
fn detect_and_tag_lunch(conn: &Connection, day: NaiveDate) -> Result<()> {
    let cutoff = format!("{} {}", day_key(day), LUNCH_CUTOFF);

    let at_or_after: Option<(i64, String)> = conn
        .query_row(
            "SELECT rowid, id FROM Event WHERE date(time) = ?1 AND time >= ?2
             ORDER BY time ASC, rowid ASC LIMIT 1",
            params![day_key(day), cutoff],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let boundary = match at_or_after {
        None => None,
        Some((rowid, kind)) if kind == "close" => Some(rowid),
        Some(_) => conn
            .query_row(
                "SELECT rowid, id FROM Event WHERE date(time) = ?1 AND time < ?2
                 ORDER BY time DESC, rowid DESC LIMIT 1",
                params![day_key(day), cutoff],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?
            .and_then(|(rowid, kind)| (kind == "close").then_some(rowid)),
    };

    if let Some(rowid) = boundary {
        debug!("Retagging close event {rowid} as lunch");
        conn.execute("UPDATE Event SET id = 'lunch' WHERE rowid = ?1", params![rowid])?;
    }
    Ok(())
}
