// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ADM Entry Point
//!
//! The process takes no CLI flags: it reads `adm.yml` from the working
//! directory, routes its log and run report to files under `dev/`, and
//! exits zero on clean completion (including partial runs whose failed
//! keys were quarantined for the next attempt) or non-zero when setup or
//! a phase died fatally.
//!
//! Wiring order follows the layers: logging, configuration, journal,
//! adapters, resource manager, orchestrator.

use std::path::Path;
use std::process;
use std::sync::Arc;

use tracing::{error, info};

use adm_bootstrap::logger::DEV_DIR;
use adm_bootstrap::{init_logging, ExitCode, RunLog};

use adm::application::services::{
    Migrator, MigratorOptions, RunSummary, CHANNEL_BUFFER_SIZE,
};
use adm::infrastructure::adapters::{FileReader, FileWriter, GilesReader, HttpQueryTransport};
use adm::infrastructure::config::{AdmConfig, ReadMode, WriteMode};
use adm::infrastructure::repositories::{SqliteJournal, DB_NAME};
use adm::infrastructure::runtime::ResourceManager;

use adm_domain::repositories::{SinkWriter, SourceReader};
use adm_domain::AdmError;

const QUARANTINE_FILE: &str = "quarantine.log";

#[tokio::main]
async fn main() -> process::ExitCode {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("could not determine working directory: {e}");
            return ExitCode::Failure.into();
        }
    };

    let paths = match init_logging(&cwd) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("could not initialize logging: {e}");
            return ExitCode::Failure.into();
        }
    };
    let run_log = match RunLog::create(&paths.run_output) {
        Ok(run_log) => run_log,
        Err(e) => {
            error!(error = %e, "could not create run report");
            return ExitCode::Failure.into();
        }
    };

    let config = match AdmConfig::load(&cwd) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration failed");
            let _ = run_log.line(&format!("configuration error: {e}"));
            return ExitCode::ConfigError.into();
        }
    };

    match run(&cwd, &config, &run_log).await {
        Ok(summary) => {
            report(&run_log, &summary);
            if summary.is_fatal() {
                ExitCode::Failure.into()
            } else {
                ExitCode::Success.into()
            }
        }
        Err(e) => {
            error!(error = %e, "migration aborted");
            let _ = run_log.line(&format!("migration aborted: {e}"));
            if matches!(e, AdmError::InvalidConfiguration(_)) {
                ExitCode::ConfigError.into()
            } else {
                ExitCode::Failure.into()
            }
        }
    }
}

async fn run(cwd: &Path, config: &AdmConfig, run_log: &RunLog) -> Result<RunSummary, AdmError> {
    info!(
        worker_size = config.worker_size,
        open_io = config.open_io,
        chunk_size = config.chunk_size,
        "starting migration"
    );
    let _ = run_log.line("migration starting");

    let journal = Arc::new(SqliteJournal::open(&cwd.join(DB_NAME)).await?);
    let reader = build_reader(config);
    let writer = build_writer(config)?;
    let resources = Arc::new(ResourceManager::new(config.worker_size, config.open_io));

    let options = MigratorOptions {
        uuid_dest: config.uuid_dest.clone(),
        metadata_dest: config.metadata_dest.clone(),
        timeseries_dest: config.timeseries_dest.clone(),
        quarantine_dest: cwd.join(DEV_DIR).join(QUARANTINE_FILE),
        chunk_size: config.chunk_size,
        channel_buffer: CHANNEL_BUFFER_SIZE,
    };

    Migrator::new(reader, writer, journal, resources, options)
        .run()
        .await
}

fn build_reader(config: &AdmConfig) -> Arc<dyn SourceReader> {
    match config.read_mode {
        ReadMode::GilesQuery => {
            let transport = Arc::new(HttpQueryTransport::new(config.source_url.clone()));
            Arc::new(GilesReader::new(transport))
        }
        ReadMode::File => Arc::new(FileReader::new(
            config.uuid_dest.clone(),
            config.metadata_dest.clone(),
        )),
    }
}

fn build_writer(config: &AdmConfig) -> Result<Arc<dyn SinkWriter>, AdmError> {
    match config.write_mode {
        WriteMode::File => Ok(Arc::new(FileWriter::new())),
        // the query service is read-only in every deployment seen so far
        WriteMode::GilesQuery => Err(AdmError::invalid_configuration(
            "write_mode giles_query is not supported, use file",
        )),
    }
}

fn report(run_log: &RunLog, summary: &RunSummary) {
    let lines = [
        format!("streams: {}", summary.uuids),
        format!("metadata phase: {}", summary.metadata),
        format!(
            "timeseries phase: {} ({} chunks)",
            summary.timeseries, summary.chunks
        ),
        format!("quarantined keys: {}", summary.quarantined),
    ];
    for line in lines {
        info!("{line}");
        let _ = run_log.line(&line);
    }
}
