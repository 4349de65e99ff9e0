// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ADM Bootstrap
//!
//! Process-level concerns that run before and around the migration core:
//! routing the structured log and the human-readable run report to files
//! under `dev/`, and mapping run outcomes to process exit codes.
//!
//! The migrator takes no CLI flags; everything the process needs comes
//! from the configuration file in the working directory. What the original
//! deployment did with process-wide stdout redirection is modeled here as
//! explicit values: [`logger::init_logging`] builds the tracing pipeline,
//! and [`logger::RunLog`] is the handle `main` writes the run report
//! through. No module-level mutable state.

pub mod exit_code;
pub mod logger;

pub use exit_code::ExitCode;
pub use logger::{init_logging, LogPaths, RunLog};
