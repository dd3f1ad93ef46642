//! Zstd payload transform for the compressed write variant
//!
//! The compressor keeps its zstd context and output buffer alive across
//! calls, so repeated payloads compress without reallocating. That state
//! makes it unsafe for concurrent use: it lives inside the single frame
//! writer task and is never handed to producers.

use zstd::bulk::{Compressor, Decompressor};
use zstd::zstd_safe;

use crate::error::{FramelogError, Result};

/// Default zstd compression level
pub const DEFAULT_LEVEL: i32 = 3;

/// Stateful compress-before-frame transform, confined to the writer task
pub struct ZstdTransform {
    compressor: Compressor<'static>,
    buf: Vec<u8>,
}

impl ZstdTransform {
    /// Create a transform at the given zstd level
    pub fn new(level: i32) -> Result<Self> {
        let compressor =
            Compressor::new(level).map_err(|e| FramelogError::Compression(e.to_string()))?;
        Ok(Self {
            compressor,
            buf: Vec::new(),
        })
    }

    /// Compress a payload, reusing the internal output buffer
    ///
    /// The returned slice is only valid until the next call.
    pub fn compress(&mut self, payload: &[u8]) -> Result<&[u8]> {
        self.buf.clear();
        self.buf.reserve(zstd_safe::compress_bound(payload.len()));
        self.compressor
            .compress_to_buffer(payload, &mut self.buf)
            .map_err(|e| FramelogError::Compression(e.to_string()))?;
        Ok(&self.buf)
    }
}

impl std::fmt::Debug for ZstdTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZstdTransform")
            .field("buf_capacity", &self.buf.capacity())
            .finish()
    }
}

/// Decompress one payload produced by [`ZstdTransform::compress`]
///
/// `max_size` bounds the decompressed output; a payload claiming to expand
/// beyond it is rejected.
pub fn decompress(payload: &[u8], max_size: usize) -> Result<Vec<u8>> {
    let mut decompressor =
        Decompressor::new().map_err(|e| FramelogError::Compression(e.to_string()))?;
    decompressor
        .decompress(payload, max_size)
        .map_err(|e| FramelogError::Compression(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{self, CpuRecord};

    const MAX_DECOMPRESSED: usize = 1024 * 1024;

    #[test]
    fn compress_then_decompress_round_trips() {
        let mut transform = ZstdTransform::new(DEFAULT_LEVEL).unwrap();
        let payload = record::encode(&CpuRecord::fixed()).unwrap();

        let compressed = transform.compress(&payload).unwrap().to_vec();
        let restored = decompress(&compressed, MAX_DECOMPRESSED).unwrap();
        assert_eq!(restored, payload.as_ref());
    }

    #[test]
    fn record_survives_compress_frame_decompress_decode() {
        let mut transform = ZstdTransform::new(DEFAULT_LEVEL).unwrap();

        let all_zero = CpuRecord {
            brand: String::new(),
            name: String::new(),
            cores: 0,
            threads: 0,
            min_clock_ghz: 0.0,
            max_clock_ghz: 0.0,
        };
        let maximal = CpuRecord {
            brand: "B".repeat(256),
            name: "N".repeat(256),
            cores: u32::MAX,
            threads: u32::MAX,
            min_clock_ghz: f64::MAX,
            max_clock_ghz: f64::MAX,
        };

        for record in [all_zero, maximal, CpuRecord::fixed(), CpuRecord::random()] {
            let payload = record::encode(&record).unwrap();
            let compressed = transform.compress(&payload).unwrap().to_vec();
            let restored = decompress(&compressed, MAX_DECOMPRESSED).unwrap();
            assert_eq!(record::decode(&restored).unwrap(), record);
        }
    }

    #[test]
    fn buffer_is_reused_across_calls() {
        let mut transform = ZstdTransform::new(DEFAULT_LEVEL).unwrap();
        let payload = record::encode(&CpuRecord::fixed()).unwrap();

        transform.compress(&payload).unwrap();
        let capacity = transform.buf.capacity();
        for _ in 0..10 {
            transform.compress(&payload).unwrap();
        }
        assert_eq!(transform.buf.capacity(), capacity);
    }

    #[test]
    fn oversized_claim_is_rejected() {
        let mut transform = ZstdTransform::new(DEFAULT_LEVEL).unwrap();
        let big = vec![0u8; 4096];
        let compressed = transform.compress(&big).unwrap().to_vec();
        let err = decompress(&compressed, 16).unwrap_err();
        assert!(matches!(err, FramelogError::Compression(_)));
    }
}
