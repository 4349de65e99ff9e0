// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Journal Status
//!
//! The per-key progress states recorded in the progress journal, and the
//! fixed run-state keys that mark whole-phase completion.
//!
//! The journal distinguishes "no entry exists" from every explicit state:
//! reads return `Option<JournalStatus>` and a missing key is `None` (the
//! NIL of the journal contract). No stored entry ever holds a NIL value.
//!
//! The state machine per key is strictly forward:
//!
//! ```text
//! (none) -> NotStarted -> WriteStart -> WriteComplete
//! ```
//!
//! Once a key reaches `WriteComplete` it is never re-read and never
//! re-written on any subsequent run.

use serde::{Deserialize, Serialize};

/// Explicit progress states for a journaled key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JournalStatus {
    /// The key is known but no work has been attempted.
    NotStarted,
    /// Work on the key has been scheduled in this run.
    WriteStart,
    /// The key's output is durably persisted. Terminal.
    WriteComplete,
}

impl JournalStatus {
    /// Stable on-disk encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalStatus::NotStarted => "not_started",
            JournalStatus::WriteStart => "write_start",
            JournalStatus::WriteComplete => "write_complete",
        }
    }

    /// Parses the on-disk encoding; unknown strings yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_started" => Some(JournalStatus::NotStarted),
            "write_start" => Some(JournalStatus::WriteStart),
            "write_complete" => Some(JournalStatus::WriteComplete),
            _ => None,
        }
    }
}

/// Fixed run-state keys marking phase completion across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    UuidsFetched,
    WindowsFetched,
    UuidsWritten,
    MetadataWritten,
    TimeseriesWritten,
}

impl RunState {
    /// Every run-state key; the journal seeds all of them to
    /// [`JournalStatus::NotStarted`] on first open.
    pub const ALL: [RunState; 5] = [
        RunState::UuidsFetched,
        RunState::WindowsFetched,
        RunState::UuidsWritten,
        RunState::MetadataWritten,
        RunState::TimeseriesWritten,
    ];

    /// Stable journal key for this run-state entry.
    pub fn key(&self) -> &'static str {
        match self {
            RunState::UuidsFetched => "uuids_fetched",
            RunState::WindowsFetched => "windows_fetched",
            RunState::UuidsWritten => "uuids_written",
            RunState::MetadataWritten => "metadata_written",
            RunState::TimeseriesWritten => "timeseries_written",
        }
    }
}
