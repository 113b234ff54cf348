use std::{path::Path, path::PathBuf, time::Duration};

use anyhow::Result;
use collection::{collector::SignalCollectionModule, LockSample};
use processing::{session_save::SessionSaver, ProcessingModule};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    lock_api::{GenericSessionSignal, SessionSignal},
    tracker::{Tracker, WORKDAY_DB_FILE},
    utils::clock::{Clock, DefaultClock},
    workday::WorkdayLedger,
};

pub mod args;
pub mod collection;
pub mod processing;
pub mod session;
pub mod shutdown;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Represents the starting point for the daemon.
pub async fn start_daemon(dir: PathBuf, background: bool) -> Result<()> {
    std::env::set_current_dir("/")?;

    let (sender, receiver) = mpsc::channel::<LockSample>(10);
    let probe = GenericSessionSignal::new()?;

    let shutdown_token = CancellationToken::new();

    let collector = create_collector(
        sender,
        probe,
        &shutdown_token,
        DEFAULT_POLL_INTERVAL,
        DefaultClock,
    );

    let processor = create_processor(&dir, background, receiver, DefaultClock).await?;

    let (_, collection_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        collector.run(),
        processor.run(),
    );

    if let Err(collection_result) = collection_result {
        error!("Collection module got an error {:?}", collection_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    Ok(())
}

fn create_collector(
    sender: mpsc::Sender<LockSample>,
    probe: impl SessionSignal + 'static,
    shutdown_token: &CancellationToken,
    poll_interval: Duration,
    clock: impl Clock,
) -> SignalCollectionModule {
    SignalCollectionModule::new(
        sender,
        Box::new(probe),
        shutdown_token.clone(),
        poll_interval,
        Box::new(clock),
    )
}

async fn create_processor(
    dir: &Path,
    background: bool,
    receiver: mpsc::Receiver<LockSample>,
    clock: impl Clock + Clone,
) -> Result<ProcessingModule<SessionSaver>> {
    let ledger = WorkdayLedger::open(
        &dir.join(WORKDAY_DB_FILE),
        background,
        Box::new(clock.clone()),
    )?;
    let tracker = Tracker::load(dir, ledger, Box::new(clock)).await?;
    Ok(ProcessingModule::new(receiver, SessionSaver::new(tracker)))
}
