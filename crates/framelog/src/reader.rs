//! Sequential frame reader
//!
//! Frames are self-describing only when read in order, so the scan is a
//! single task walking the file from offset 0. End-of-file is valid only at
//! a frame boundary (exactly where the next length prefix would begin);
//! running dry anywhere else is a truncation fault, never a clean EOF.

use std::path::Path;

use bytes::Bytes;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::debug;

use crate::error::{FramelogError, Result};

/// Buffered, strictly in-order scan over a framed file
#[derive(Debug)]
pub struct FrameReader {
    file: BufReader<tokio::fs::File>,
    offset: u64,
    frames: u64,
}

impl FrameReader {
    /// Open the file read-only, positioned at the first frame
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .open(path.as_ref())
            .await
            .map_err(|e| FramelogError::Io(e.to_string()))?;

        Ok(Self {
            file: BufReader::new(file),
            offset: 0,
            frames: 0,
        })
    }

    /// Read the next frame's payload, or `None` at a boundary-aligned EOF
    ///
    /// A short read inside the length prefix or the payload is a
    /// [`FramelogError::TruncatedFrame`] carrying the faulting offset.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        let mut prefix = [0u8; 4];
        let mut filled = 0usize;
        while filled < prefix.len() {
            let n = self
                .file
                .read(&mut prefix[filled..])
                .await
                .map_err(|e| FramelogError::Io(e.to_string()))?;
            if n == 0 {
                if filled == 0 {
                    debug!(frames = self.frames, "Clean end of frame stream");
                    return Ok(None);
                }
                return Err(FramelogError::TruncatedFrame {
                    offset: self.offset + filled as u64,
                });
            }
            filled += n;
        }

        let len = u32::from_le_bytes(prefix) as usize;
        let mut payload = vec![0u8; len];
        self.file
            .read_exact(&mut payload)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => FramelogError::TruncatedFrame {
                    offset: self.offset + prefix.len() as u64,
                },
                _ => FramelogError::Io(e.to_string()),
            })?;

        self.offset += (prefix.len() + len) as u64;
        self.frames += 1;
        Ok(Some(Bytes::from(payload)))
    }

    /// Frames successfully read so far
    pub fn frames_read(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_frames(path: &std::path::Path, payloads: &[&[u8]]) {
        let mut bytes = Vec::new();
        for payload in payloads {
            bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            bytes.extend_from_slice(payload);
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[tokio::test]
    async fn empty_file_is_a_clean_eof() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frames.bin");
        write_frames(&path, &[]);

        let mut reader = FrameReader::open(&path).await.unwrap();
        assert!(reader.next_frame().await.unwrap().is_none());
        assert_eq!(reader.frames_read(), 0);
    }

    #[tokio::test]
    async fn frames_come_back_in_file_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frames.bin");
        write_frames(&path, &[b"first", b"second", b""]);

        let mut reader = FrameReader::open(&path).await.unwrap();
        assert_eq!(reader.next_frame().await.unwrap().unwrap(), &b"first"[..]);
        assert_eq!(reader.next_frame().await.unwrap().unwrap(), &b"second"[..]);
        assert_eq!(reader.next_frame().await.unwrap().unwrap(), &b""[..]);
        assert!(reader.next_frame().await.unwrap().is_none());
        assert_eq!(reader.frames_read(), 3);
    }

    #[tokio::test]
    async fn truncation_inside_the_prefix_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frames.bin");
        write_frames(&path, &[b"whole frame"]);

        // Cut two bytes into the second frame's length prefix.
        let bytes = std::fs::read(&path).unwrap();
        let mut cut = bytes.clone();
        cut.extend_from_slice(&[0x05, 0x00]);
        std::fs::write(&path, &cut).unwrap();

        let mut reader = FrameReader::open(&path).await.unwrap();
        reader.next_frame().await.unwrap().unwrap();
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, FramelogError::TruncatedFrame { .. }));
        assert_eq!(reader.frames_read(), 1);
    }

    #[tokio::test]
    async fn truncation_inside_the_payload_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frames.bin");
        write_frames(&path, &[b"first", b"second"]);

        // Drop the tail of the final payload.
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let mut reader = FrameReader::open(&path).await.unwrap();
        reader.next_frame().await.unwrap().unwrap();
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, FramelogError::TruncatedFrame { .. }));
        assert_eq!(reader.frames_read(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FrameReader::open(dir.path().join("absent.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, FramelogError::Io(_)));
    }
}
