use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Encoding used for the `time` column of the event ledger. Zero padded so the
/// raw text column sorts chronologically.
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// This is the standard way of converting a date to a string in taskclock.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

pub fn format_event_time(moment: NaiveDateTime) -> String {
    moment.format(EVENT_TIME_FORMAT).to_string()
}

pub fn parse_event_time(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, EVENT_TIME_FORMAT)
        .with_context(|| format!("Illegal ledger timestamp {text:?}"))
}
