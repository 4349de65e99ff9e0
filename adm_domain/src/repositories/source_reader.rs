// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Reader Port
//!
//! The four read operations the migrator drives against a source: stream
//! enumeration, density windows, metadata, and time-series ranges.
//!
//! The streaming operations take the sending end of a bounded channel and
//! push tuples as payloads arrive; a slow consumer throttles the reader
//! through channel backpressure. The reader is the channel's sole producer
//! and closes it by dropping the sender on every return path, so the
//! consumer's loop always terminates.
//!
//! ## Failure split
//!
//! `Err(AdmError)` means the operation could not make progress (fatal for
//! the calling phase). Keys that individually failed while the rest of the
//! operation succeeded come back in the report's `failed` list; the caller
//! quarantines them and leaves them incomplete in the journal.

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::error::{AdmError, FailedKey};
use crate::value_objects::{MetadataTuple, TimeSlot, TimeseriesTuple, Window};

/// Per-key failures of a streaming read operation.
#[derive(Debug, Default)]
pub struct ReadReport {
    pub failed: Vec<FailedKey>,
}

impl ReadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a window fetch: the windows that decoded, in batch order with
/// duplicates by UUID suppressed (first wins), plus the UUIDs that failed.
#[derive(Debug, Default)]
pub struct WindowsRead {
    pub windows: Vec<Window>,
    pub failed: Vec<FailedKey>,
}

impl WindowsRead {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A source of streams: the remote query service or a previous archive.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Enumerates every stream identifier the source knows. Any transport
    /// or decode failure is fatal; nothing downstream can run without the
    /// population.
    async fn read_uuids(&self) -> Result<Vec<String>, AdmError>;

    /// Fetches the density window of each given stream, batched with a
    /// per-UUID fallback when a batch fails.
    async fn read_windows(&self, uuids: &[String]) -> Result<WindowsRead, AdmError>;

    /// Fetches metadata for the given streams, batched with a per-UUID
    /// fallback, sending one [`MetadataTuple`] per successful batch (or
    /// per fallback UUID) into `out`.
    async fn read_metadata(
        &self,
        uuids: &[String],
        out: Sender<MetadataTuple>,
    ) -> Result<ReadReport, AdmError>;

    /// Fetches each slot's bounded sample range, one query per slot (a
    /// single slot may already be large), sending a [`TimeseriesTuple`]
    /// per successful slot into `out`.
    async fn read_timeseries(
        &self,
        slots: &[TimeSlot],
        out: Sender<TimeseriesTuple>,
    ) -> Result<ReadReport, AdmError>;
}
