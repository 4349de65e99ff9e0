// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sink Writer Port
//!
//! The three append operations the migrator drives against its archive
//! destination. The streaming operations drain a channel to closure and
//! report, per key, what was durably persisted and what failed; they never
//! consult the progress journal themselves. The orchestrator marks only
//! the non-failed keys complete, after the writer returns.
//!
//! Structural failures (create, open, bracket writes, close) are fatal:
//! the destination is deleted and `Err` returned. Per-payload failures are
//! partial: the key lands in `failed`, the destination is retained, and
//! draining continues so the producer is never deadlocked mid-send.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

use crate::error::{AdmError, FailedKey};
use crate::value_objects::{MetadataTuple, TimeSlot, TimeseriesTuple};

/// Keys persisted and keys lost by a metadata write pass.
#[derive(Debug, Default)]
pub struct MetadataWrite {
    pub written: Vec<String>,
    pub failed: Vec<FailedKey>,
}

impl MetadataWrite {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Slots persisted and slots lost by a time-series write pass.
#[derive(Debug, Default)]
pub struct TimeseriesWrite {
    pub written: Vec<TimeSlot>,
    pub failed: Vec<FailedKey>,
}

impl TimeseriesWrite {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An archive destination for UUID lists, metadata, and time-series data.
#[async_trait]
pub trait SinkWriter: Send + Sync {
    /// Writes the full UUID list as one JSON array, truncate-and-write.
    /// Fatal on any I/O error; a partial file is removed.
    async fn write_uuids(&self, dest: &Path, uuids: &[String]) -> Result<(), AdmError>;

    /// Appends metadata payloads drained from `input` to `dest`, comma
    /// separated in producer order and wrapped in `[` and `]`.
    async fn write_metadata(
        &self,
        dest: &Path,
        input: Receiver<MetadataTuple>,
    ) -> Result<MetadataWrite, AdmError>;

    /// Appends time-series payloads drained from `input` to `dest` under
    /// the same bracket discipline as metadata.
    async fn write_timeseries(
        &self,
        dest: &Path,
        input: Receiver<TimeseriesTuple>,
    ) -> Result<TimeseriesWrite, AdmError>;
}
