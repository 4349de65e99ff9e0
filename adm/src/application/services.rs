// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Application services.

pub mod migrator;
pub mod quarantine;

pub use migrator::{Migrator, MigratorOptions, PhaseOutcome, RunSummary, CHANNEL_BUFFER_SIZE};
pub use quarantine::{QuarantineHandle, QuarantineWriter};
