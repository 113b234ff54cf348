use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{lock_api::SessionSignal, utils::clock::Clock};

use super::LockSample;

/// Polls the lock probe on a fixed cadence and feeds samples to the
/// processing side.
pub struct SignalCollectionModule {
    next: mpsc::Sender<LockSample>,
    probe: Box<dyn SessionSignal>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl SignalCollectionModule {
    pub fn new(
        next: mpsc::Sender<LockSample>,
        probe: Box<dyn SessionSignal>,
        shutdown: CancellationToken,
        poll_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            probe,
            shutdown,
            poll_interval,
            time_provider,
        }
    }

    /// A probe that can't be queried counts as unlocked. Timing must keep
    /// going when the probe degrades, the worst case is an uncounted lock.
    fn sample(&mut self) -> LockSample {
        let locked = match self.probe.is_locked() {
            Ok(locked) => locked,
            Err(e) => {
                warn!("Lock probe failed, assuming unlocked {e:?}");
                false
            }
        };
        LockSample {
            locked,
            moment: self.time_provider.now(),
        }
    }

    /// Executes the poll loop.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.time_provider.instant();
        loop {
            poll_point += self.poll_interval;

            let sample = self.sample();
            debug!("Sending sample {:?}", sample);
            self.next
                .send(sample)
                .await
                .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;

            tokio::select! {
                // Cancelation stops the loop, drops the sender and thereby
                // drains and finalizes the processing module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(poll_point) => ()
            }
        }
    }
}
