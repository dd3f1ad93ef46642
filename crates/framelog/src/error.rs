//! Error types for the framelog pipeline

use thiserror::Error;

/// Errors that can occur in the write or read pipeline
#[derive(Debug, Error)]
pub enum FramelogError {
    /// Record could not be serialized
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Byte sequence is not a valid record encoding
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Payload does not fit in the 4-byte length prefix
    #[error("Frame payload of {len} bytes exceeds the u32 length prefix")]
    FrameTooLarge { len: usize },

    /// Short read in the middle of a frame (not at a frame boundary)
    #[error("Truncated frame at byte offset {offset}")]
    TruncatedFrame { offset: u64 },

    /// Write syscall failed; frames flushed before the fault remain on disk
    #[error("Write failed after {flushed} frames: {cause}")]
    WriteFailed { flushed: u64, cause: String },

    /// I/O error outside the framed portion of a read or write
    #[error("I/O error: {0}")]
    Io(String),

    /// Writer or coordinator saw fewer payloads than it was promised
    #[error("Expected {expected} payloads, received {actual}")]
    CountMismatch { expected: u64, actual: u64 },

    /// One or more decode tasks failed; the full tally is preserved
    #[error("Decode batch failed: {failed} payloads did not decode ({succeeded} succeeded)")]
    DecodeBatch { succeeded: u64, failed: u64 },

    /// Compression or decompression error in the zstd transform
    #[error("Compression error: {0}")]
    Compression(String),
}

impl From<std::io::Error> for FramelogError {
    fn from(err: std::io::Error) -> Self {
        FramelogError::Io(err.to_string())
    }
}

/// Result type for framelog operations
pub type Result<T> = std::result::Result<T, FramelogError>;
