//! Record type and binary codec
//!
//! Records are postcard-serialized into compact binary payloads. Encoding and
//! decoding are pure and hold no shared state, so they are safe to call from
//! any number of tasks at once.

use bytes::Bytes;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FramelogError, Result};

/// A CPU inventory record, the unit of data flowing through the pipeline
///
/// Immutable once constructed; it has no identity beyond its field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuRecord {
    pub brand: String,
    pub name: String,
    pub cores: u32,
    pub threads: u32,
    pub min_clock_ghz: f64,
    pub max_clock_ghz: f64,
}

impl CpuRecord {
    /// The canonical fixed record used by deterministic runs
    pub fn fixed() -> Self {
        Self {
            brand: "X".to_string(),
            name: "Y".to_string(),
            cores: 1,
            threads: 2,
            min_clock_ghz: 1.0,
            max_clock_ghz: 2.0,
        }
    }

    /// A record with randomized numeric fields
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self {
            brand: "X".to_string(),
            name: "Y".to_string(),
            cores: rng.random_range(0..16),
            threads: rng.random_range(0..64),
            min_clock_ghz: rng.random_range(0.0..5.0),
            max_clock_ghz: rng.random_range(0.0..10.0),
        }
    }
}

/// Where producer tasks get their records from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordSource {
    /// Every call yields [`CpuRecord::fixed`]
    #[default]
    Fixed,
    /// Every call yields [`CpuRecord::random`]
    Random,
}

impl RecordSource {
    /// Produce the next record
    pub fn next_record(&self) -> CpuRecord {
        match self {
            RecordSource::Fixed => CpuRecord::fixed(),
            RecordSource::Random => CpuRecord::random(),
        }
    }
}

/// Serialize a record into a binary payload
pub fn encode(record: &CpuRecord) -> Result<Bytes> {
    postcard::to_allocvec(record)
        .map(Bytes::from)
        .map_err(|e| FramelogError::Encoding(e.to_string()))
}

/// Deserialize a binary payload back into a record
///
/// Fails with [`FramelogError::Decoding`] on malformed or truncated input,
/// which callers can tell apart from I/O errors raised further up the stack.
pub fn decode(bytes: &[u8]) -> Result<CpuRecord> {
    postcard::from_bytes(bytes).map_err(|e| FramelogError::Decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_record_round_trips() {
        let record = CpuRecord::fixed();
        let payload = encode(&record).unwrap();
        let decoded = decode(&payload).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn random_records_round_trip() {
        for _ in 0..100 {
            let record = CpuRecord::random();
            let payload = encode(&record).unwrap();
            assert_eq!(record, decode(&payload).unwrap());
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let record = CpuRecord::fixed();
        assert_eq!(encode(&record).unwrap(), encode(&record).unwrap());
    }

    #[test]
    fn malformed_payload_is_a_decoding_error() {
        let err = decode(&[0xFF; 3]).unwrap_err();
        assert!(matches!(err, FramelogError::Decoding(_)));
    }

    #[test]
    fn truncated_payload_is_a_decoding_error() {
        let payload = encode(&CpuRecord::fixed()).unwrap();
        let err = decode(&payload[..payload.len() - 4]).unwrap_err();
        assert!(matches!(err, FramelogError::Decoding(_)));
    }

    #[test]
    fn random_fields_stay_in_range() {
        for _ in 0..100 {
            let record = CpuRecord::random();
            assert!(record.cores < 16);
            assert!(record.threads < 64);
            assert!(record.min_clock_ghz < 5.0);
            assert!(record.max_clock_ghz < 10.0);
        }
    }
}
