// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Failed Keys
//!
//! A [`FailedKey`] identifies one unit of work a partially-failed operation
//! could not process: a stream whose metadata could not be fetched or
//! written, a stream whose density window could not be fetched, or a single
//! time slot whose sample range could not be fetched or written.
//!
//! Failed keys flow from the reader/writer reports into the quarantine
//! channel, where a dedicated task appends them to the quarantine file, one
//! line per key: `<uuid> <kind> <start> <end>`. Keys without a time range
//! (metadata, window) print `0 0`.
//!
//! A quarantined key is never consulted again within the same run; because
//! it is also never marked complete in the journal, the next run picks it
//! up again.

use std::fmt;

use crate::value_objects::TimeSlot;

/// A key the pipeline failed to process, tagged with the phase that lost it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailedKey {
    /// Metadata could not be fetched or persisted for this stream.
    Metadata(String),
    /// The density window could not be fetched for this stream.
    Window(String),
    /// This time slot's sample range could not be fetched or persisted.
    Timeseries(TimeSlot),
}

impl FailedKey {
    /// The error kind tag used in the quarantine file.
    pub fn kind(&self) -> &'static str {
        match self {
            FailedKey::Metadata(_) => "metadata",
            FailedKey::Window(_) => "window",
            FailedKey::Timeseries(_) => "timeseries",
        }
    }

    /// The stream identifier this key belongs to.
    pub fn uuid(&self) -> &str {
        match self {
            FailedKey::Metadata(uuid) | FailedKey::Window(uuid) => uuid,
            FailedKey::Timeseries(slot) => slot.uuid(),
        }
    }

    fn time_range(&self) -> (i64, i64) {
        match self {
            FailedKey::Metadata(_) | FailedKey::Window(_) => (0, 0),
            FailedKey::Timeseries(slot) => (slot.start_time_ns(), slot.end_time_ns()),
        }
    }
}

impl fmt::Display for FailedKey {
    /// Formats the key as its quarantine-file line (without the newline).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.time_range();
        write!(f, "{} {} {} {}", self.uuid(), self.kind(), start, end)
    }
}
