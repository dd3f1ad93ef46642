//! Producer pool: concurrent generate-and-encode workers
//!
//! A fixed set of worker tasks claims jobs from a shared counter until
//! exactly `count` records have been generated, encoded and pushed into the
//! writer's bounded inbox. Workers finish in whatever order they finish, so
//! the file order is arrival order at the writer, not generation order.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::error::{FramelogError, Result};
use crate::record::{self, RecordSource};

/// Worker count matching the machine's available parallelism
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Run `count` generate-encode-send jobs across a bounded pool of workers
///
/// Returns once every worker has drained its share of the batch, with the
/// number of payloads accepted by the channel. An encoding fault aborts the
/// remaining jobs and surfaces after the partial count has been logged. A
/// closed inbox (the writer stopped first) ends the batch quietly; the
/// writer's own error is the authoritative one in that case.
#[instrument(skip(outbox))]
pub async fn produce(
    workers: usize,
    count: u64,
    source: RecordSource,
    outbox: mpsc::Sender<Bytes>,
) -> Result<u64> {
    let workers = workers.max(1);
    let claimed = Arc::new(AtomicU64::new(0));
    let submitted = Arc::new(AtomicU64::new(0));
    let abort = Arc::new(AtomicBool::new(false));

    let mut pool = JoinSet::new();
    for _ in 0..workers {
        let claimed = Arc::clone(&claimed);
        let submitted = Arc::clone(&submitted);
        let abort = Arc::clone(&abort);
        let outbox = outbox.clone();

        pool.spawn(async move {
            loop {
                if abort.load(Ordering::Relaxed) {
                    return Ok(());
                }
                if claimed.fetch_add(1, Ordering::Relaxed) >= count {
                    return Ok(());
                }

                let payload = match record::encode(&source.next_record()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        abort.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                };

                // Blocks here when the queue is full; that is the
                // backpressure point of the whole write pipeline.
                if outbox.send(payload).await.is_err() {
                    return Ok(());
                }
                submitted.fetch_add(1, Ordering::Relaxed);
            }
        });
    }
    drop(outbox);

    let mut first_error = None;
    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(FramelogError::Io(e.to_string()));
            }
        }
    }

    let submitted = submitted.load(Ordering::Relaxed);
    if let Some(err) = first_error {
        warn!(submitted, "Producer batch aborted mid-run");
        return Err(err);
    }

    debug!(submitted, workers, "Producer batch complete");
    Ok(submitted)
}
