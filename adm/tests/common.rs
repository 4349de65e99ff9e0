// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared test support: a scripted in-memory source and a harness that
//! wires a real file writer and a real SQLite journal on a temp dir.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use adm::application::services::{Migrator, MigratorOptions, CHANNEL_BUFFER_SIZE};
use adm::infrastructure::adapters::FileWriter;
use adm::infrastructure::repositories::{SqliteJournal, DB_NAME};
use adm::infrastructure::runtime::ResourceManager;

use adm_domain::repositories::{ReadReport, SourceReader, WindowsRead};
use adm_domain::value_objects::{
    MetadataTuple, Reading, TimeSlot, TimeseriesTuple, Window,
};
use adm_domain::{AdmError, FailedKey};

const BATCH: usize = 10;

/// Metadata payload token for a batch, mirrored by the file assertions.
pub fn metadata_payload(uuids: &[String]) -> String {
    format!("m[{}]", uuids.join("+"))
}

/// Time-series payload token for one slot.
pub fn timeseries_payload(slot: &TimeSlot) -> String {
    format!(
        "t[{}:{}:{}]",
        slot.uuid(),
        slot.start_time_ns(),
        slot.end_time_ns()
    )
}

/// A scripted source with per-key failure injection and read counters.
pub struct MockSource {
    uuids: Vec<String>,
    windows: Vec<Window>,
    fail_windows: Mutex<HashSet<String>>,
    fail_metadata: Mutex<HashSet<String>>,
    fail_slots: Mutex<HashSet<String>>,
    pub uuid_reads: AtomicUsize,
    pub window_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub slot_reads: Mutex<Vec<TimeSlot>>,
}

impl MockSource {
    pub fn new(uuids: &[&str]) -> Self {
        Self {
            uuids: uuids.iter().map(|s| s.to_string()).collect(),
            windows: Vec::new(),
            fail_windows: Mutex::new(HashSet::new()),
            fail_metadata: Mutex::new(HashSet::new()),
            fail_slots: Mutex::new(HashSet::new()),
            uuid_reads: AtomicUsize::new(0),
            window_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            slot_reads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_window(mut self, uuid: &str, readings: &[(i64, i64)]) -> Self {
        let readings = readings
            .iter()
            .map(|&(start, count)| Reading::new(start, count))
            .collect();
        self.windows.push(Window::new(uuid, readings));
        self
    }

    pub fn fail_metadata_for(self, uuid: &str) -> Self {
        self.fail_metadata.lock().unwrap().insert(uuid.to_string());
        self
    }

    pub fn fail_window_for(self, uuid: &str) -> Self {
        self.fail_windows.lock().unwrap().insert(uuid.to_string());
        self
    }

    pub fn fail_slots_for(self, uuid: &str) -> Self {
        self.fail_slots.lock().unwrap().insert(uuid.to_string());
        self
    }

    /// Clears slot-failure injection, for resume-after-outage tests.
    pub fn heal_slots(&self) {
        self.fail_slots.lock().unwrap().clear();
    }

    pub fn slots_read(&self) -> Vec<TimeSlot> {
        self.slot_reads.lock().unwrap().clone()
    }

    fn window_for(&self, uuid: &str) -> Window {
        self.windows
            .iter()
            .find(|w| w.uuid() == uuid)
            .cloned()
            .unwrap_or_else(|| Window::new(uuid, Vec::new()))
    }
}

#[async_trait]
impl SourceReader for MockSource {
    async fn read_uuids(&self) -> Result<Vec<String>, AdmError> {
        self.uuid_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.uuids.clone())
    }

    async fn read_windows(&self, uuids: &[String]) -> Result<WindowsRead, AdmError> {
        self.window_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.fail_windows.lock().unwrap().clone();

        let mut result = WindowsRead::default();
        for uuid in uuids {
            if failing.contains(uuid) {
                result.failed.push(FailedKey::Window(uuid.clone()));
            } else {
                result.windows.push(self.window_for(uuid));
            }
        }
        Ok(result)
    }

    async fn read_metadata(
        &self,
        uuids: &[String],
        out: Sender<MetadataTuple>,
    ) -> Result<ReadReport, AdmError> {
        let failing = self.fail_metadata.lock().unwrap().clone();
        let mut report = ReadReport::default();

        for batch in uuids.chunks(BATCH) {
            if batch.iter().any(|u| failing.contains(u)) {
                // batch failure: retry each uuid alone
                for uuid in batch {
                    self.metadata_calls.fetch_add(1, Ordering::SeqCst);
                    if failing.contains(uuid) {
                        report.failed.push(FailedKey::Metadata(uuid.clone()));
                    } else {
                        let single = vec![uuid.clone()];
                        let data = metadata_payload(&single).into_bytes();
                        out.send(MetadataTuple::new(single, data))
                            .await
                            .map_err(|_| AdmError::internal("channel closed"))?;
                    }
                }
            } else {
                self.metadata_calls.fetch_add(1, Ordering::SeqCst);
                let data = metadata_payload(batch).into_bytes();
                out.send(MetadataTuple::new(batch.to_vec(), data))
                    .await
                    .map_err(|_| AdmError::internal("channel closed"))?;
            }
        }
        Ok(report)
    }

    async fn read_timeseries(
        &self,
        slots: &[TimeSlot],
        out: Sender<TimeseriesTuple>,
    ) -> Result<ReadReport, AdmError> {
        let failing = self.fail_slots.lock().unwrap().clone();
        let mut report = ReadReport::default();

        for slot in slots {
            self.slot_reads.lock().unwrap().push(slot.clone());
            if failing.contains(slot.uuid()) {
                report.failed.push(FailedKey::Timeseries(slot.clone()));
            } else {
                let data = timeseries_payload(slot).into_bytes();
                out.send(TimeseriesTuple::new(slot.clone(), data))
                    .await
                    .map_err(|_| AdmError::internal("channel closed"))?;
            }
        }
        Ok(report)
    }
}

/// A migrator wired to a scripted source, the real file writer, and a
/// real journal, all rooted in one temp dir.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub source: Arc<MockSource>,
    pub journal: Arc<SqliteJournal>,
    pub migrator: Migrator,
}

impl Harness {
    pub async fn new(source: MockSource, chunk_size: i64) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = Arc::new(source);
        let journal = Arc::new(
            SqliteJournal::open(&dir.path().join(DB_NAME))
                .await
                .expect("open journal"),
        );

        let migrator = Migrator::new(
            Arc::clone(&source) as Arc<dyn SourceReader>,
            Arc::new(FileWriter::new()),
            Arc::clone(&journal) as Arc<dyn adm_domain::repositories::ProgressJournal>,
            // roomy caps keep the window fan-out in one range, so chunk
            // contents are deterministic for exact file assertions
            Arc::new(ResourceManager::new(16, 16)),
            MigratorOptions {
                uuid_dest: dir.path().join("uuids.json"),
                metadata_dest: dir.path().join("metadata.json"),
                timeseries_dest: dir.path().join("ts.json"),
                quarantine_dest: dir.path().join("quarantine.log"),
                chunk_size,
                channel_buffer: CHANNEL_BUFFER_SIZE,
            },
        );

        Self {
            dir,
            source,
            journal,
            migrator,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub async fn file(&self, name: &str) -> String {
        tokio::fs::read_to_string(self.path(name))
            .await
            .unwrap_or_else(|e| panic!("read {name}: {e}"))
    }

    pub async fn file_exists(&self, name: &str) -> bool {
        tokio::fs::try_exists(self.path(name)).await.unwrap()
    }
}
