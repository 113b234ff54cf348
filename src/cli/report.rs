use std::{fmt::Display, path::Path};

use ansi_term::Style;
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{Parser, ValueEnum};

use crate::{
    tracker::{Tracker, WORKDAY_DB_FILE},
    utils::{clock::DefaultClock, duration::DurationFormat, time::day_key},
    workday::WorkdayLedger,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long,
        short,
        help = "Day to report. Examples are \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    day: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Workday durations print every unit, a report like `8h 52m 5s` reads better
/// than a trimmed one when comparing days.
fn workday_format() -> DurationFormat {
    DurationFormat::new("hms", false)
}

/// Command to process the `report` command: worked and lunch time for one day
/// of the event ledger.
pub async fn process_report_command(dir: &Path, command: ReportCommand) -> Result<()> {
    let day: NaiveDate = match &command.day {
        Some(expr) => parse_date_string(expr, Local::now(), command.date_style.into())
            .map_err(|e| anyhow!("Can't parse day {expr:?}: {e}"))?
            .date_naive(),
        None => Local::now().date_naive(),
    };

    let ledger = WorkdayLedger::attach(&dir.join(WORKDAY_DB_FILE), Box::new(DefaultClock))?;
    let format = workday_format();

    println!("{}", Style::new().bold().paint(day_key(day)));
    println!(
        "  worked {}",
        format.format(ledger.work_duration_for_day(day)?.num_seconds() as f64)
    );
    println!(
        "  lunch  {}",
        format.format(ledger.lunch_duration(day)?.num_seconds() as f64)
    );
    Ok(())
}

/// Shows the current task, every active task with its elapsed time, and the
/// running workday.
pub async fn print_status(dir: &Path) -> Result<()> {
    let ledger = WorkdayLedger::attach(&dir.join(WORKDAY_DB_FILE), Box::new(DefaultClock))?;
    let tracker = Tracker::load(dir, ledger, Box::new(DefaultClock)).await?;

    match tracker.current_task_name() {
        Some(current) => println!(
            "Current task: {} ({})",
            Style::new().bold().paint(current),
            tracker.elapsed_text(current)
        ),
        None => println!("Current task: none"),
    }

    let names = tracker.active_task_names();
    if names.is_empty() {
        println!("No active tasks");
    } else {
        println!("Active tasks:");
        let width = names.iter().map(|name| name.len()).max().unwrap_or(0);
        for name in names {
            println!("  {name:width$}  {}", tracker.elapsed_text(name));
        }
    }

    let format = workday_format();
    println!(
        "Today: {} worked, {} lunch",
        format.format(tracker.ledger().todays_work_duration()?.num_seconds() as f64),
        format.format(tracker.ledger().todays_lunch_duration()?.num_seconds() as f64),
    );
    Ok(())
}
