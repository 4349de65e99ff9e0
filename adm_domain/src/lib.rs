// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ADM Domain
//!
//! The domain layer of the archival data migrator: the vocabulary of the
//! migration (streams, density windows, time slots, chunks), the planning
//! rules that turn windows into bounded units of work, and the ports that
//! infrastructure adapters implement. It is independent of the HTTP
//! transport, the on-disk journal format, and the output file layout.
//!
//! ## Module Structure
//!
//! - [`value_objects`]: immutable migration values. A [`Window`] is the
//!   coarse per-stream sample histogram; a [`TimeSlot`] is one bounded time
//!   range of one stream and the unit of durable progress; a [`Chunk`]
//!   groups slots that share one output file; tuples bind fetched payload
//!   bytes to their originating keys while in flight on a channel.
//! - [`services`]: the chunk planner, a stateless packing rule over slots.
//! - [`repositories`]: the ports. [`SourceReader`] and [`SinkWriter`] are
//!   the two ends of every pipeline phase; [`ProgressJournal`] is the
//!   durable keyed state that makes interrupted runs resumable.
//! - [`error`]: [`AdmError`] for fatal causes, [`FailedKey`] for the keys a
//!   partially-failed operation could not process.
//!
//! ## Error Philosophy
//!
//! Every fallible operation distinguishes two outcomes (see the quarantine
//! path in the application layer):
//!
//! - **fatal**: the operation could not make progress at all. Surfaced as
//!   `Err(AdmError)`; the owning phase aborts and its run-state key stays
//!   short of complete.
//! - **failed keys**: some keys could not be processed while the rest
//!   succeeded. Surfaced inside the operation's report value as a list of
//!   [`FailedKey`], quarantined by the caller, and omitted from the
//!   journal's completed set so a later run re-attempts them.

pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-export commonly used types for convenience
pub use error::{AdmError, FailedKey};
pub use repositories::{
    MetadataWrite, ProgressJournal, ReadReport, SinkWriter, SourceReader, TimeseriesWrite,
    WindowsRead,
};
pub use services::{ChunkPacker, FINAL_SLOT_UUID};
pub use value_objects::{
    Chunk, JournalStatus, MetadataTuple, Reading, RunState, TimeSlot, TimeseriesTuple, Window,
    END_TIME_NOW,
};
