// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration
//!
//! ADM takes no CLI flags; everything comes from `adm.yml` in the working
//! directory:
//!
//! ```yaml
//! source_url: http://giles.example.net:8079/api/query
//! worker_size: 10
//! open_io: 10
//! uuid_dest: archive/uuids.json
//! metadata_dest: archive/metadata.json
//! timeseries_dest: archive/ts.json
//! read_mode: giles_query
//! write_mode: file
//! chunk_size: 2000000
//! ```
//!
//! On first run (no config file) a skeleton is written and loading fails
//! with instructions, so the operator fills it in and reruns. A malformed
//! file or an unknown mode also fails initialization; the pipeline never
//! starts on a half-understood configuration.

use std::io;
use std::path::{Path, PathBuf};

use adm_domain::AdmError;
use serde::Deserialize;

/// Configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "adm.yml";

/// Smallest capacity either semaphore may have: below two permits a
/// reader/writer pair can never be scheduled.
pub const MIN_CONCURRENCY: usize = 2;

const SKELETON: &str = "source_url:\nworker_size:\nopen_io:\nuuid_dest:\nmetadata_dest:\n\
                        timeseries_dest:\nread_mode:\nwrite_mode:\nchunk_size:\n";

/// Which source adapter to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    GilesQuery,
    File,
}

/// Which sink adapter to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    GilesQuery,
    File,
}

/// The full run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmConfig {
    pub source_url: String,
    pub worker_size: usize,
    pub open_io: usize,
    pub uuid_dest: PathBuf,
    pub metadata_dest: PathBuf,
    pub timeseries_dest: PathBuf,
    pub read_mode: ReadMode,
    pub write_mode: WriteMode,
    pub chunk_size: i64,
}

impl AdmConfig {
    /// Loads and validates `adm.yml` from `dir`. A missing file writes a
    /// skeleton and returns an instructive error.
    pub fn load(dir: &Path) -> Result<Self, AdmError> {
        let path = dir.join(CONFIG_FILE);

        let body = match std::fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                std::fs::write(&path, SKELETON).map_err(|e| {
                    AdmError::invalid_configuration(format!(
                        "could not create skeleton {}: {e}",
                        path.display()
                    ))
                })?;
                return Err(AdmError::invalid_configuration(format!(
                    "no configuration found; a skeleton {} was created, fill it in and rerun",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(AdmError::invalid_configuration(format!(
                    "could not read {}: {e}",
                    path.display()
                )));
            }
        };

        let config: AdmConfig = serde_yaml::from_str(&body).map_err(|e| {
            AdmError::invalid_configuration(format!("malformed {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AdmError> {
        if self.read_mode == ReadMode::GilesQuery && self.source_url.is_empty() {
            return Err(AdmError::invalid_configuration(
                "source_url must be set for the giles_query read mode",
            ));
        }
        if self.worker_size < MIN_CONCURRENCY {
            return Err(AdmError::invalid_configuration(format!(
                "worker_size must be at least {MIN_CONCURRENCY}"
            )));
        }
        if self.open_io < MIN_CONCURRENCY {
            return Err(AdmError::invalid_configuration(format!(
                "open_io must be at least {MIN_CONCURRENCY}"
            )));
        }
        if self.chunk_size <= 0 {
            return Err(AdmError::invalid_configuration(
                "chunk_size must be positive",
            ));
        }
        for (name, dest) in [
            ("uuid_dest", &self.uuid_dest),
            ("metadata_dest", &self.metadata_dest),
            ("timeseries_dest", &self.timeseries_dest),
        ] {
            if dest.as_os_str().is_empty() {
                return Err(AdmError::invalid_configuration(format!(
                    "{name} must be set"
                )));
            }
        }
        Ok(())
    }
}
