//! Pipeline assembly
//!
//! Wires the stages together: producer pool -> bounded queue -> frame writer
//! on the way out, sequential reader -> decode fan-out -> ledger on the way
//! back. These entry points are what the CLI driver calls.

use std::path::Path;

use tokio::sync::{mpsc, oneshot};
use tracing::{info, instrument, warn};

use crate::compress::{self, ZstdTransform};
use crate::coordinator::{self, DecodeTally};
use crate::error::{FramelogError, Result};
use crate::producer;
use crate::reader::FrameReader;
use crate::record::{self, RecordSource};
use crate::writer::FrameWriter;

/// Knobs for the write and read pipelines
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Producer pool size; defaults to available hardware parallelism
    pub workers: usize,
    /// Capacity of the pending write queue; producers block when it fills.
    /// Set it to at least the record count for fully non-blocking fan-out.
    pub queue_capacity: usize,
    /// Record generator fed to the producers
    pub source: RecordSource,
    /// Compress each payload before framing (writer-confined zstd)
    pub compress: bool,
    /// Give each decode task a synthetic 100-500us downstream-store delay
    pub decode_delay: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: producer::default_workers(),
            queue_capacity: 1024,
            source: RecordSource::Fixed,
            compress: false,
            decode_delay: false,
        }
    }
}

impl PipelineConfig {
    fn transform(&self) -> Result<Option<ZstdTransform>> {
        if self.compress {
            ZstdTransform::new(compress::DEFAULT_LEVEL).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Outcome of a write pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Frames flushed to the file
    pub frames: u64,
}

/// Outcome of a read pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSummary {
    /// Frames scanned off the file
    pub frames: u64,
    /// Decode tasks that succeeded
    pub succeeded: u64,
    /// Decode tasks that failed
    pub failed: u64,
}

/// Generate `count` records concurrently and append them as frames
///
/// Producer workers race to encode and submit; the single writer task owns
/// the file and appends in arrival order, so the file order is not the
/// generation order. Returns once the writer has flushed exactly `count`
/// frames.
#[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
pub async fn write_records(
    path: impl AsRef<Path>,
    count: u64,
    config: &PipelineConfig,
) -> Result<WriteSummary> {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let writer = FrameWriter::create(path.as_ref(), rx, count, config.transform()?).await?;
    let writer_task = tokio::spawn(writer.run());

    let produced = producer::produce(config.workers, count, config.source, tx).await;
    let written = writer_task
        .await
        .map_err(|e| FramelogError::Io(e.to_string()))?;

    if let Err(e) = produced {
        // The producer fault is primary; the writer's count mismatch is
        // just its echo.
        warn!(error = %e, "Write pipeline aborted by producer fault");
        return Err(e);
    }

    let frames = written?;
    info!(frames, "Write pipeline complete");
    Ok(WriteSummary { frames })
}

/// Baseline variant: generate and append records one at a time
///
/// Same frame writer, fed by a single inline producer over a capacity-one
/// queue. This is the sequential number the concurrent pipeline is timed
/// against.
#[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
pub async fn write_records_sequential(
    path: impl AsRef<Path>,
    count: u64,
    config: &PipelineConfig,
) -> Result<WriteSummary> {
    let (tx, rx) = mpsc::channel(1);
    let writer = FrameWriter::create(path.as_ref(), rx, count, config.transform()?).await?;
    let writer_task = tokio::spawn(writer.run());

    for _ in 0..count {
        let payload = record::encode(&config.source.next_record())?;
        if tx.send(payload).await.is_err() {
            break;
        }
    }
    drop(tx);

    let frames = writer_task
        .await
        .map_err(|e| FramelogError::Io(e.to_string()))??;
    info!(frames, "Sequential write complete");
    Ok(WriteSummary { frames })
}

/// Scan a framed file in order and fan decoding out across tasks
///
/// The ledger learns the expected total only after the scan reaches a clean
/// EOF, then drains every decode report before returning. A non-zero failure
/// count surfaces as [`FramelogError::DecodeBatch`] so a bad batch still
/// fails at the caller boundary, with the full tally attached.
#[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
pub async fn read_records(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<ReadSummary> {
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let (expected_tx, expected_rx) = oneshot::channel();
    let ledger = tokio::spawn(coordinator::run_ledger(report_rx, expected_rx));

    let mut reader = FrameReader::open(path.as_ref()).await?;
    loop {
        match reader.next_frame().await {
            Ok(Some(payload)) => {
                coordinator::spawn_decode(payload, report_tx.clone(), config.decode_delay);
            }
            Ok(None) => break,
            Err(e) => {
                warn!(frames = reader.frames_read(), error = %e, "Scan aborted");
                ledger.abort();
                return Err(e);
            }
        }
    }

    let frames = reader.frames_read();
    drop(report_tx);
    let _ = expected_tx.send(frames);

    let DecodeTally { succeeded, failed } = ledger
        .await
        .map_err(|e| FramelogError::Io(e.to_string()))??;
    if failed > 0 {
        return Err(FramelogError::DecodeBatch { succeeded, failed });
    }

    info!(frames, succeeded, "Read pipeline complete");
    Ok(ReadSummary {
        frames,
        succeeded,
        failed,
    })
}
