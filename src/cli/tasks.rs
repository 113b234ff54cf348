//! One-shot edits of the task log. The stores have a single writer, so these
//! are meant for driving the tracker from scripts or while the daemon is
//! stopped; `taskclock stop` first if in doubt.

use std::path::Path;

use anyhow::Result;

use crate::{
    tracker::{Tracker, WORKDAY_DB_FILE},
    utils::clock::DefaultClock,
    workday::WorkdayLedger,
};

async fn edit<R>(dir: &Path, operate: impl FnOnce(&mut Tracker) -> R) -> Result<R> {
    let ledger = WorkdayLedger::attach(&dir.join(WORKDAY_DB_FILE), Box::new(DefaultClock))?;
    let mut tracker = Tracker::load(dir, ledger, Box::new(DefaultClock)).await?;
    let result = operate(&mut tracker);
    // An edit is not a shutdown: suppress the closing idle marker so timing
    // continues across the save.
    tracker.set_keep_running(true);
    tracker.save().await?;
    Ok(result)
}

pub async fn start_task(dir: &Path, name: &str) -> Result<()> {
    edit(dir, |tracker| tracker.set_current_task(name)).await?;
    println!("Now timing {name}");
    Ok(())
}

pub async fn mark_idle(dir: &Path) -> Result<()> {
    edit(dir, |tracker| tracker.mark_idle()).await?;
    println!("Idle");
    Ok(())
}

pub async fn drop_task(dir: &Path, name: &str) -> Result<()> {
    edit(dir, |tracker| tracker.remove_task(name)).await?;
    println!("Dropped {name}");
    Ok(())
}

/// Prints the elapsed time of a task and folds it into the reported total, so
/// the next claim starts from zero. The printed value is what the excluded
/// presentation layer would put on the clipboard.
pub async fn claim_task(dir: &Path, name: &str) -> Result<()> {
    let elapsed = edit(dir, |tracker| tracker.claim_elapsed(name)).await?;
    println!("{elapsed}");
    Ok(())
}
