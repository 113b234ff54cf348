use anyhow::Result;
use module::SampleProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error};

use super::collection::LockSample;

pub mod module;
pub mod session_save;

/// Receives lock samples and hands them to the processor. When the channel
/// drains (collector gone) the processor gets finalized, which is the only
/// shutdown path and must not be skipped.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<LockSample>,
    processor: Processor,
}

impl<P: SampleProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<LockSample>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(sample) = self.receiver.recv().await {
            debug!("Processing sample {:?}", sample);
            if let Err(e) = self.processor.process_next(sample).await {
                // A failed save is terminal for that save only, the loop
                // keeps polling.
                error!("Error processing sample {:?}: {e:?}", sample);
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
