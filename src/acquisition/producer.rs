use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{Scope, ScopedJoinHandle};
use std::time::Duration;
use log::{debug, error, warn};
use crate::acquisition::{AcquisitionBuffer, CaptureError, SampleSource};
/// Counters reported by the producer once it has been joined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub polls: u64,
    pub failed_polls: u64,
    pub samples_appended: u64,
    pub overflowed: bool,
}
/// Poll `source` until a stop request arrives (or the sender is dropped),
/// appending every batch to `buffer`.
///
/// Failed polls are logged and skipped. A full buffer ends the loop; the
/// buffer latches the overflow so the timeline can abort the run.
pub fn run_producer<S: SampleSource>(
    mut source: S,
    buffer: &AcquisitionBuffer,
    poll_interval: Duration,
    stop: Receiver<()>,
) -> ProducerStats {
    let mut stats = ProducerStats::default();
    loop {
        stats.polls += 1;
        match source.poll() {
            Ok(batch) if batch.is_empty() => {}
            Ok(batch) => {
                let before = buffer.current_index();
                match buffer.append_batch(&batch) {
                    Ok(after) => stats.samples_appended += (after - before) as u64,
                    Err(e @ CaptureError::BufferFull { .. }) => {
                        error!("Recording aborted: {e}");
                        stats.samples_appended += (buffer.current_index() - before) as u64;
                        stats.overflowed = true;
                        break;
                    }
                    Err(e) => warn!("Dropped batch: {e}"),
                }
            }
            Err(e) => {
                stats.failed_polls += 1;
                warn!("Error fetching data: {e}");
            }
        }
        match stop.recv_timeout(poll_interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(
        "Producer stopped after {} polls ({} failed), {} samples appended",
        stats.polls, stats.failed_polls, stats.samples_appended
    );
    stats
}
/// Start the producer on a scoped thread that borrows `buffer`.
pub fn spawn_producer<'scope, 'env, S>(
    scope: &'scope Scope<'scope, 'env>,
    source: S,
    buffer: &'env AcquisitionBuffer,
    poll_interval: Duration,
    stop: Receiver<()>,
) -> ScopedJoinHandle<'scope, ProducerStats>
where
    S: SampleSource + 'env,
{
    scope.spawn(move || run_producer(source, buffer, poll_interval, stop))
}
