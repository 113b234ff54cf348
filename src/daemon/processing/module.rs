use anyhow::Result;

use crate::daemon::collection::LockSample;

/// Represents a consumer of lock samples. Abstracts the session bookkeeping
/// away from the receive loop so tests can drive it directly.
pub trait SampleProcessor {
    fn process_next(&mut self, sample: LockSample) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
