// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Progress Journal Port
//!
//! The durable keyed store that makes interrupted runs resumable. Four
//! logical namespaces back the typed operations below:
//!
//! - **run-state**: the fixed [`RunState`] keys marking phase completion.
//! - **windows**: stream UUID to its fetched density [`Window`].
//! - **uuid-metadata**: stream UUID to its metadata [`JournalStatus`].
//! - **uuid-timeseries**: slot identity to its time-series status.
//!
//! ## Contract
//!
//! Reads and writes are atomic at the entry level and safe to issue
//! concurrently from many tasks; writes to the same key serialize. The
//! store survives process crash with at most the last in-flight write
//! lost. Opening the journal creates missing namespaces and seeds every
//! missing run-state key to [`JournalStatus::NotStarted`]; all other keys
//! stay absent until first written, and reads of absent keys return
//! `None` so callers can tell "never seen" from "seen and not started".
//!
//! Status updates for a key must happen after the write they record, never
//! before: once a slot or UUID reads back as `WriteComplete`, no run will
//! ever fetch or write it again.

use async_trait::async_trait;

use crate::error::AdmError;
use crate::value_objects::{JournalStatus, RunState, TimeSlot, Window};

/// Durable, crash-safe progress state shared by every pipeline phase.
#[async_trait]
pub trait ProgressJournal: Send + Sync {
    /// Reads a run-state key; `None` only before the journal seeded it.
    async fn run_state(&self, key: RunState) -> Result<Option<JournalStatus>, AdmError>;

    async fn set_run_state(&self, key: RunState, status: JournalStatus) -> Result<(), AdmError>;

    async fn metadata_status(&self, uuid: &str) -> Result<Option<JournalStatus>, AdmError>;

    async fn set_metadata_status(
        &self,
        uuid: &str,
        status: JournalStatus,
    ) -> Result<(), AdmError>;

    /// Key set of the uuid-metadata namespace; the enumeration phase
    /// rebuilds the UUID population from it on resumed runs.
    async fn metadata_uuids(&self) -> Result<Vec<String>, AdmError>;

    async fn timeseries_status(&self, slot: &TimeSlot) -> Result<Option<JournalStatus>, AdmError>;

    async fn set_timeseries_status(
        &self,
        slot: &TimeSlot,
        status: JournalStatus,
    ) -> Result<(), AdmError>;

    async fn window(&self, uuid: &str) -> Result<Option<Window>, AdmError>;

    async fn put_window(&self, window: &Window) -> Result<(), AdmError>;

    /// Every persisted window, in a deterministic (key-ordered) sequence,
    /// so resumed runs plan chunks reproducibly.
    async fn windows(&self) -> Result<Vec<Window>, AdmError>;
}
