//! Decode fan-out and completion ledger
//!
//! Every payload the reader yields becomes its own decode task (deliberately
//! unbounded, reproducing the original stress shape). Tasks report success
//! or failure to the ledger, which also waits for the expected total - the
//! reader only knows it once the scan hits EOF. The ledger runs until
//! `succeeded + failed == expected` and hands back the full tally; a single
//! bad payload no longer tears the batch down mid-flight, the caller decides
//! what a non-zero failure count means.

use std::time::Duration;

use bytes::Bytes;
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{FramelogError, Result};
use crate::record;

/// Final ledger state after all expected reports have been drained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeTally {
    pub succeeded: u64,
    pub failed: u64,
}

/// Spawn one decode task for a payload
///
/// The task optionally sleeps 100-500us first, standing in for a downstream
/// store write, then decodes and reports the outcome to the ledger.
pub fn spawn_decode(payload: Bytes, reports: mpsc::UnboundedSender<bool>, synthetic_delay: bool) {
    tokio::spawn(async move {
        if synthetic_delay {
            let micros = rand::rng().random_range(100..500);
            tokio::time::sleep(Duration::from_micros(micros)).await;
        }

        let outcome = record::decode(&payload);
        if let Err(e) = &outcome {
            warn!(error = %e, "Decode task failed");
        }
        let _ = reports.send(outcome.is_ok());
    });
}

/// Drain decode reports until the expected total has been reached
///
/// `expected` arrives over the oneshot once the sequential scan finishes;
/// reports may arrive before, after, or interleaved with it. Terminates
/// exactly when `succeeded + failed == expected`. Report senders that all
/// drop before that point, or an expected-count sender that drops without
/// sending, surface as [`FramelogError::CountMismatch`] instead of a hang.
pub async fn run_ledger(
    mut reports: mpsc::UnboundedReceiver<bool>,
    mut expected_rx: oneshot::Receiver<u64>,
) -> Result<DecodeTally> {
    let mut succeeded = 0u64;
    let mut failed = 0u64;
    let mut expected: Option<u64> = None;
    let mut reports_closed = false;

    loop {
        if let Some(total) = expected {
            let received = succeeded + failed;
            if received == total {
                break;
            }
            if reports_closed {
                return Err(FramelogError::CountMismatch {
                    expected: total,
                    actual: received,
                });
            }
        }

        tokio::select! {
            total = &mut expected_rx, if expected.is_none() => {
                match total {
                    Ok(total) => {
                        debug!(total, "Ledger learned expected count");
                        expected = Some(total);
                    }
                    Err(_) => {
                        // The scan died before announcing a total.
                        return Err(FramelogError::CountMismatch {
                            expected: 0,
                            actual: succeeded + failed,
                        });
                    }
                }
            }
            report = reports.recv(), if !reports_closed => {
                match report {
                    Some(true) => succeeded += 1,
                    Some(false) => failed += 1,
                    None => reports_closed = true,
                }
            }
        }
    }

    debug!(succeeded, failed, "Ledger complete");
    Ok(DecodeTally { succeeded, failed })
}
