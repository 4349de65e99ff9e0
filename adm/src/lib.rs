// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archival Data Migrator
//!
//! ADM drains a remote time-series query service into a local file
//! archive: every stream's descriptive metadata plus its complete sample
//! history, for populations of thousands of streams whose sizes span many
//! orders of magnitude. Runs are resumable: a crash-safe progress journal
//! records per-key completion, so a restarted run re-attempts only the
//! keys that never finished.
//!
//! ## Layers
//!
//! - [`application`]: the pipeline orchestrator that sequences the phases
//!   (enumerate, metadata, windows, chunked time-series) and the
//!   quarantine writer that records permanently-bad keys.
//! - [`infrastructure`]: the adapters behind the domain ports. The Giles
//!   query reader speaks the remote dialect over a retrying HTTP
//!   transport; the file writer materializes the archive; the SQLite
//!   journal persists progress; the resource manager caps logical workers
//!   and open I/O independently.
//!
//! The domain vocabulary (windows, time slots, chunks, journal statuses)
//! and the ports live in the `adm-domain` crate; process bootstrap
//! (logging under `dev/`, exit codes) lives in `adm-bootstrap`.

pub mod application;
pub mod infrastructure;
