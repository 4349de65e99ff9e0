// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Logging
//!
//! The migrator is designed to run unattended for hours, so nothing goes
//! to the terminal: the structured `tracing` log lands in `dev/adm.log`
//! and the short human-readable run report in `dev/out.log`, both under
//! the working directory.
//!
//! [`init_logging`] must run once, before any other component logs.
//! [`RunLog`] is an explicit value handed to whoever writes the report;
//! it replaces the original deployment's process-wide stdout redirection.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Directory (under the working directory) holding both output files.
pub const DEV_DIR: &str = "dev";

const PROCESS_LOG_FILE: &str = "adm.log";
const RUN_OUTPUT_FILE: &str = "out.log";

/// Locations of the two files the bootstrap routes process output to.
#[derive(Debug, Clone)]
pub struct LogPaths {
    /// Structured tracing log, appended across runs.
    pub process_log: PathBuf,
    /// Human-readable run report, truncated per run.
    pub run_output: PathBuf,
}

/// Creates `dev/` and installs the global tracing subscriber writing to
/// `dev/adm.log`. Call exactly once, first thing in `main`.
pub fn init_logging(base: &Path) -> io::Result<LogPaths> {
    let dev_dir = base.join(DEV_DIR);
    fs::create_dir_all(&dev_dir)?;

    let process_log = dev_dir.join(PROCESS_LOG_FILE);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&process_log)?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Arc::new(log_file))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(LogPaths {
        process_log,
        run_output: dev_dir.join(RUN_OUTPUT_FILE),
    })
}

/// The run report sink: what the process would have printed to stdout.
///
/// Line-buffered and safe to share across tasks; each `line` call writes
/// and flushes one complete line.
#[derive(Debug)]
pub struct RunLog {
    file: Mutex<File>,
}

impl RunLog {
    /// Creates (truncating) the run report file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one line to the report and flushes it.
    pub fn line(&self, message: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("run log lock poisoned"))?;
        writeln!(file, "{message}")?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_writes_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.log");

        let run_log = RunLog::create(&path).expect("create");
        run_log.line("first").expect("write");
        run_log.line("second").expect("write");

        let body = fs::read_to_string(&path).expect("read");
        assert_eq!(body, "first\nsecond\n");
    }

    #[test]
    fn test_run_log_truncates_previous_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.log");

        RunLog::create(&path)
            .expect("create")
            .line("stale")
            .expect("write");
        let run_log = RunLog::create(&path).expect("recreate");
        run_log.line("fresh").expect("write");

        let body = fs::read_to_string(&path).expect("read");
        assert_eq!(body, "fresh\n");
    }
}
