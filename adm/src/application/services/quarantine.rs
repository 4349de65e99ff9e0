// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Quarantine Writer
//!
//! Permanently-bad keys are routed here instead of failing their phase: a
//! single task owns the quarantine file and drains a channel of
//! [`FailedKey`]s until every phase has dropped its sender, appending one
//! line per key (`<uuid> <kind> <start> <end>`).
//!
//! The channel is unbounded so reporting a failure can never block or
//! deadlock a phase; the key population is bounded by the input size. The
//! quarantine file is never consulted by the pipeline within the same
//! run; quarantined keys simply stay short of complete in the journal, so
//! the next run re-attempts them.

use std::path::PathBuf;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use adm_domain::{AdmError, FailedKey};

use crate::infrastructure::runtime::{spawn_supervised, AdmResult};

/// Cloneable reporting handle held by the phases. Dropping every handle
/// closes the channel and lets the writer task finish.
#[derive(Debug, Clone)]
pub struct QuarantineHandle {
    tx: UnboundedSender<FailedKey>,
}

impl QuarantineHandle {
    /// Reports one failed key. Reporting after the writer stopped can
    /// only happen on a fatal quarantine failure; the key is then logged
    /// instead of silently lost.
    pub fn report(&self, key: FailedKey) {
        if let Err(e) = self.tx.send(key) {
            warn!(key = %e.0, "quarantine writer gone, key only in log");
        }
    }

    pub fn report_all(&self, keys: impl IntoIterator<Item = FailedKey>) {
        for key in keys {
            self.report(key);
        }
    }
}

/// The single writer that owns the quarantine file.
pub struct QuarantineWriter;

impl QuarantineWriter {
    /// Spawns the writer task; returns the reporting handle and the join
    /// handle yielding the number of quarantined keys.
    pub fn spawn(dest: PathBuf) -> (QuarantineHandle, JoinHandle<AdmResult<usize>>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<FailedKey>();

        let task = spawn_supervised("quarantine-writer", async move {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&dest)
                .await
                .map_err(|e| {
                    AdmError::io_error(format!("open quarantine {}: {e}", dest.display()))
                })?;

            let mut count = 0usize;
            while let Some(key) = rx.recv().await {
                let line = format!("{key}\n");
                file.write_all(line.as_bytes()).await.map_err(|e| {
                    AdmError::io_error(format!("append quarantine {}: {e}", dest.display()))
                })?;
                count += 1;
            }

            file.flush()
                .await
                .map_err(|e| AdmError::io_error(format!("flush quarantine: {e}")))?;
            if count > 0 {
                info!(count, dest = %dest.display(), "quarantined keys recorded");
            }
            Ok(count)
        });

        (QuarantineHandle { tx }, task)
    }
}
