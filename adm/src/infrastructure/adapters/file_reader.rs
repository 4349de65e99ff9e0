// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Source Reader
//!
//! [`FileReader`] serves the FILE read mode: it replays a previously
//! written archive instead of querying the remote service. The UUID list
//! comes from the UUID file; metadata payloads come from the metadata
//! archive, matched to requested streams by each record's `uuid` field.
//!
//! Flat archives carry neither density histograms nor per-range indexes,
//! so `read_windows` and `read_timeseries` are fatal for this adapter.
//! The orchestrator treats that like any other fatal phase error: the
//! time-series phase aborts while the metadata phase proceeds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::mpsc::Sender;
use tracing::warn;

use adm_domain::repositories::{ReadReport, SourceReader, WindowsRead};
use adm_domain::value_objects::{MetadataTuple, TimeSlot, TimeseriesTuple};
use adm_domain::{AdmError, FailedKey};

/// Reader over a previously written file archive.
#[derive(Debug)]
pub struct FileReader {
    uuid_file: PathBuf,
    metadata_file: PathBuf,
}

impl FileReader {
    pub fn new(uuid_file: PathBuf, metadata_file: PathBuf) -> Self {
        Self {
            uuid_file,
            metadata_file,
        }
    }

    async fn read_json(path: &Path) -> Result<Vec<serde_json::Value>, AdmError> {
        let body = fs::read(path)
            .await
            .map_err(|e| AdmError::io_error(format!("read {}: {e}", path.display())))?;
        serde_json::from_slice(&body)
            .map_err(|e| AdmError::decode(format!("decode {}: {e}", path.display())))
    }
}

#[async_trait]
impl SourceReader for FileReader {
    async fn read_uuids(&self) -> Result<Vec<String>, AdmError> {
        let body = fs::read(&self.uuid_file)
            .await
            .map_err(|e| AdmError::io_error(format!("read {}: {e}", self.uuid_file.display())))?;
        serde_json::from_slice(&body).map_err(|e| {
            AdmError::decode(format!(
                "decode uuid list {}: {e}",
                self.uuid_file.display()
            ))
        })
    }

    async fn read_windows(&self, _uuids: &[String]) -> Result<WindowsRead, AdmError> {
        Err(AdmError::internal(
            "file source does not provide sample density windows",
        ))
    }

    async fn read_metadata(
        &self,
        uuids: &[String],
        out: Sender<MetadataTuple>,
    ) -> Result<ReadReport, AdmError> {
        let records = Self::read_json(&self.metadata_file).await?;

        let mut by_uuid: HashMap<&str, &serde_json::Value> = HashMap::new();
        for record in &records {
            if let Some(uuid) = record.get("uuid").and_then(|v| v.as_str()) {
                by_uuid.entry(uuid).or_insert(record);
            }
        }

        let mut report = ReadReport::default();
        for uuid in uuids {
            match by_uuid.get(uuid.as_str()) {
                Some(record) => {
                    let data = serde_json::to_vec(record)
                        .map_err(|e| AdmError::internal(format!("re-encode metadata: {e}")))?;
                    if out
                        .send(MetadataTuple::new(vec![uuid.clone()], data))
                        .await
                        .is_err()
                    {
                        return Err(AdmError::internal("metadata channel closed by consumer"));
                    }
                }
                None => {
                    warn!(uuid = %uuid, "uuid not present in metadata archive");
                    report.failed.push(FailedKey::Metadata(uuid.clone()));
                }
            }
        }
        Ok(report)
    }

    async fn read_timeseries(
        &self,
        _slots: &[TimeSlot],
        _out: Sender<TimeseriesTuple>,
    ) -> Result<ReadReport, AdmError> {
        Err(AdmError::internal(
            "file source does not provide sample ranges",
        ))
    }
}
