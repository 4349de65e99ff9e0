// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Sink Writer
//!
//! [`FileWriter`] materializes the archive on disk. Every streamed output
//! is a sequence of upstream payloads written verbatim, comma separated in
//! producer order and wrapped in `[` and `]`, so each destination is a
//! valid JSON array of whatever the source returned.
//!
//! Failure discipline:
//!
//! - Structural failures (create, open, bracket writes, flush) are fatal:
//!   the destination is deleted and the operation returns `Err`.
//! - A failed payload write records the tuple's keys as failed and keeps
//!   draining, so the producing reader is never left blocked on a full
//!   channel.
//!
//! The writer never consults the progress journal; it reports exactly
//! which keys it persisted and the orchestrator journals them. Each
//! destination is single-writer for the duration of a call; the
//! orchestrator guarantees that by allocating one destination per chunk
//! and one call per phase.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, warn};

use adm_domain::repositories::{MetadataWrite, SinkWriter, TimeseriesWrite};
use adm_domain::value_objects::{MetadataTuple, TimeseriesTuple};
use adm_domain::{AdmError, FailedKey};

/// Archive writer over the local file system.
#[derive(Debug, Default)]
pub struct FileWriter;

impl FileWriter {
    pub fn new() -> Self {
        Self
    }

    /// Opens `dest` for appending, writing the opening bracket first if
    /// the file does not exist yet. Fatal failures remove the file.
    async fn open_for_append(dest: &Path) -> Result<File, AdmError> {
        let exists = fs::try_exists(dest)
            .await
            .map_err(|e| AdmError::io_error(format!("stat {}: {e}", dest.display())))?;

        if !exists {
            if let Err(e) = fs::write(dest, b"[").await {
                remove_partial(dest).await;
                return Err(AdmError::io_error(format!(
                    "create {}: {e}",
                    dest.display()
                )));
            }
        }

        match OpenOptions::new().append(true).open(dest).await {
            Ok(file) => Ok(file),
            Err(e) => {
                remove_partial(dest).await;
                Err(AdmError::io_error(format!("open {}: {e}", dest.display())))
            }
        }
    }

    /// Appends `]` (when anything was written this call) and flushes.
    async fn seal(dest: &Path, file: &mut File, wrote: bool) -> Result<(), AdmError> {
        if wrote {
            if let Err(e) = file.write_all(b"]").await {
                remove_partial(dest).await;
                return Err(AdmError::io_error(format!(
                    "close bracket {}: {e}",
                    dest.display()
                )));
            }
        }
        if let Err(e) = file.flush().await {
            remove_partial(dest).await;
            return Err(AdmError::io_error(format!("flush {}: {e}", dest.display())));
        }
        Ok(())
    }
}

async fn remove_partial(dest: &Path) {
    if let Err(e) = fs::remove_file(dest).await {
        warn!(dest = %dest.display(), error = %e, "could not remove partial destination");
    }
}

fn payload_record(first: bool, data: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(data.len() + 1);
    if !first {
        record.push(b',');
    }
    record.extend_from_slice(data);
    record
}

#[async_trait]
impl SinkWriter for FileWriter {
    async fn write_uuids(&self, dest: &Path, uuids: &[String]) -> Result<(), AdmError> {
        let body = serde_json::to_vec(uuids)
            .map_err(|e| AdmError::internal(format!("encode uuid list: {e}")))?;

        if let Err(e) = fs::write(dest, body).await {
            remove_partial(dest).await;
            return Err(AdmError::io_error(format!(
                "write uuids to {}: {e}",
                dest.display()
            )));
        }
        debug!(dest = %dest.display(), count = uuids.len(), "uuid list written");
        Ok(())
    }

    async fn write_metadata(
        &self,
        dest: &Path,
        mut input: Receiver<MetadataTuple>,
    ) -> Result<MetadataWrite, AdmError> {
        let mut file = Self::open_for_append(dest).await?;
        let mut report = MetadataWrite::default();
        let mut first = true;
        let mut wrote = false;

        while let Some(tuple) = input.recv().await {
            let (uuids, data) = tuple.into_parts();
            match file.write_all(&payload_record(first, &data)).await {
                Ok(()) => {
                    first = false;
                    wrote = true;
                    report.written.extend(uuids);
                }
                Err(e) => {
                    warn!(dest = %dest.display(), error = %e, "metadata payload write failed");
                    report
                        .failed
                        .extend(uuids.into_iter().map(FailedKey::Metadata));
                }
            }
        }

        Self::seal(dest, &mut file, wrote).await?;
        Ok(report)
    }

    async fn write_timeseries(
        &self,
        dest: &Path,
        mut input: Receiver<TimeseriesTuple>,
    ) -> Result<TimeseriesWrite, AdmError> {
        let mut file = Self::open_for_append(dest).await?;
        let mut report = TimeseriesWrite::default();
        let mut first = true;
        let mut wrote = false;

        while let Some(tuple) = input.recv().await {
            let (slot, data) = tuple.into_parts();
            match file.write_all(&payload_record(first, &data)).await {
                Ok(()) => {
                    first = false;
                    wrote = true;
                    report.written.push(slot);
                }
                Err(e) => {
                    warn!(dest = %dest.display(), error = %e, "timeseries payload write failed");
                    report.failed.push(FailedKey::Timeseries(slot));
                }
            }
        }

        Self::seal(dest, &mut file, wrote).await?;
        Ok(report)
    }
}

/// Generates the per-chunk destination: the template's basename is split
/// on its first `.` and the chunk index is inserted before the suffix
/// (`ts.json` becomes `ts0.json`, `ts1.json`, ...).
pub fn chunk_destination(template: &Path, index: usize) -> PathBuf {
    let name = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let chunk_name = match name.split_once('.') {
        Some((stem, suffix)) => format!("{stem}{index}.{suffix}"),
        None => format!("{name}{index}"),
    };

    template.with_file_name(chunk_name)
}
