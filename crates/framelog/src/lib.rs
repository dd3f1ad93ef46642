//! # Framelog
//!
//! A concurrent length-prefixed record log.
//!
//! Records are postcard-serialized into binary payloads, framed with a
//! 4-byte little-endian length prefix, and appended sequentially to a single
//! append-only file. Reading is symmetric: a strictly in-order scan yields
//! payloads that fan out across decode tasks, with a ledger tracking the
//! completion count.
//!
//! ## Pipeline shape
//!
//! ```text
//! producers -> bounded queue -> frame writer -> file
//! file -> sequential reader -> decode fan-out -> ledger
//! ```
//!
//! The frame writer is the sole owner of the file descriptor; payloads reach
//! it only through its inbox, and it exits after consuming exactly the
//! expected number of payloads. The optional zstd transform compresses
//! payloads before framing and is confined to the writer task.
//!
//! ## On-disk format
//!
//! ```text
//! [4 bytes: u32_le length][length bytes: payload][4 bytes: u32_le length][...]
//! ```
//!
//! No header, footer, checksum, or stored record count; the count is only
//! known by scanning to a boundary-aligned EOF.
//!
//! ## Example
//!
//! ```rust,ignore
//! use framelog::{read_records, write_records, PipelineConfig, RecordSource};
//!
//! #[tokio::main]
//! async fn main() -> framelog::Result<()> {
//!     let config = PipelineConfig {
//!         source: RecordSource::Random,
//!         ..Default::default()
//!     };
//!
//!     let written = write_records("records.bin", 1_000_000, &config).await?;
//!     let summary = read_records("records.bin", &config).await?;
//!     assert_eq!(summary.succeeded, written.frames);
//!     Ok(())
//! }
//! ```

pub mod compress;
pub mod coordinator;
pub mod error;
pub mod pipeline;
pub mod producer;
pub mod reader;
pub mod record;
pub mod writer;

pub use compress::ZstdTransform;
pub use coordinator::DecodeTally;
pub use error::{FramelogError, Result};
pub use pipeline::{
    PipelineConfig, ReadSummary, WriteSummary, read_records, write_records,
    write_records_sequential,
};
pub use reader::FrameReader;
pub use record::{CpuRecord, RecordSource, decode, encode};
pub use writer::FrameWriter;
