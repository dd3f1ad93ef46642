//! Frame writer: sole owner of the output file
//!
//! Exactly one writer task exists per file. Payloads arrive through a
//! bounded channel and are appended as `[u32_le length][payload]` frames in
//! strict receive order. The writer is told the total payload count up front
//! and exits as soon as it has flushed that many frames; a channel that
//! closes earlier is reported as a count mismatch instead of hanging.

use std::path::Path;

use bytes::Bytes;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::compress::ZstdTransform;
use crate::error::{FramelogError, Result};

/// Appends length-prefixed frames to a freshly-truncated file
pub struct FrameWriter {
    file: BufWriter<tokio::fs::File>,
    inbox: mpsc::Receiver<Bytes>,
    expected: u64,
    transform: Option<ZstdTransform>,
}

impl FrameWriter {
    /// Open (create + truncate) the output file and bind it to an inbox
    ///
    /// `expected` is the number of payloads the writer will consume before
    /// exiting. An optional zstd transform compresses each payload before
    /// framing; the length prefix always describes the bytes actually
    /// written, whatever transform produced them.
    pub async fn create(
        path: impl AsRef<Path>,
        inbox: mpsc::Receiver<Bytes>,
        expected: u64,
        transform: Option<ZstdTransform>,
    ) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())
            .await
            .map_err(|e| FramelogError::Io(e.to_string()))?;

        Ok(Self {
            file: BufWriter::new(file),
            inbox,
            expected,
            transform,
        })
    }

    /// Consume payloads until `expected` frames have been written
    ///
    /// Returns the number of frames flushed. On a write fault the writer
    /// stops consuming immediately; frames already flushed remain on disk.
    #[instrument(skip(self), fields(expected = self.expected))]
    pub async fn run(mut self) -> Result<u64> {
        let mut flushed = 0u64;

        while flushed < self.expected {
            let Some(payload) = self.inbox.recv().await else {
                return Err(FramelogError::CountMismatch {
                    expected: self.expected,
                    actual: flushed,
                });
            };

            let frame: &[u8] = match self.transform.as_mut() {
                Some(transform) => transform.compress(&payload)?,
                None => &payload,
            };

            let len = frame.len();
            let Ok(prefix_len) = u32::try_from(len) else {
                return Err(FramelogError::FrameTooLarge { len });
            };

            if let Err(e) = self.file.write_all(&prefix_len.to_le_bytes()).await {
                return Err(FramelogError::WriteFailed {
                    flushed,
                    cause: e.to_string(),
                });
            }
            if let Err(e) = self.file.write_all(frame).await {
                return Err(FramelogError::WriteFailed {
                    flushed,
                    cause: e.to_string(),
                });
            }

            flushed += 1;
        }

        self.file
            .flush()
            .await
            .map_err(|e| FramelogError::WriteFailed {
                flushed,
                cause: e.to_string(),
            })?;

        debug!(flushed, "Frame writer finished");
        Ok(flushed)
    }
}
