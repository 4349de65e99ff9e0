// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Migration Orchestrator
//!
//! [`Migrator`] sequences a full run:
//!
//! 1. **Enumerate**: fetch the stream population (or reload it from the
//!    journal's key set when a previous run already fetched it), seed the
//!    per-stream journal entries, and write the UUID archive file.
//! 2. **Metadata phase** and **time-series phase**, in parallel. Each
//!    phase early-returns when its run-state key is already complete.
//!    - Metadata streams reader to writer through one bounded channel.
//!    - Time-series first collects density windows (fanned out over UUID
//!      ranges sized from current semaphore occupancy, deduplicated, and
//!      persisted to the journal), then drives the chunk packer over the
//!      planning order. Every emitted chunk gets a fresh destination file
//!      and its own reader/writer channel pair; chunks run concurrently
//!      up to the semaphore caps and are awaited together at the end.
//! 3. **Join**: the quarantine channel closes and the quarantine writer
//!    drains out.
//!
//! ## Progress discipline
//!
//! Slots and UUIDs are marked `WriteStart` when scheduled and
//! `WriteComplete` only after the writer reports them persisted, so a
//! crash between the two re-attempts the key. Zero-count slots complete
//! immediately without a fetch. A phase's run-state key is set complete
//! only when the phase saw no failures at all, which is what lets the
//! next run skip it wholesale.
//!
//! ## Failure routing
//!
//! Fatal errors abort their phase (the sibling phase keeps running) and
//! surface in the run summary. Per-key failures are quarantined and leave
//! their keys incomplete; the run still exits zero so operators can
//! distinguish "retry later" from "broken".

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use adm_domain::repositories::{ProgressJournal, SinkWriter, SourceReader};
use adm_domain::value_objects::{Chunk, JournalStatus, RunState, TimeSlot, Window};
use adm_domain::{AdmError, ChunkPacker};

use crate::infrastructure::adapters::file_writer::chunk_destination;
use crate::infrastructure::runtime::{
    join_supervised, spawn_supervised, AdmResult, ResourceManager,
};

use super::quarantine::{QuarantineHandle, QuarantineWriter};

/// Buffer of every reader/writer channel pair.
pub const CHANNEL_BUFFER_SIZE: usize = 10;

/// Destination paths and planning knobs for one run.
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    pub uuid_dest: PathBuf,
    pub metadata_dest: PathBuf,
    pub timeseries_dest: PathBuf,
    pub quarantine_dest: PathBuf,
    pub chunk_size: i64,
    pub channel_buffer: usize,
}

/// How one phase ended.
#[derive(Debug)]
pub enum PhaseOutcome {
    /// Every key persisted; the run-state key is complete.
    Complete,
    /// Some keys were quarantined; the run-state key stays short of
    /// complete and the next run re-attempts them.
    Partial(usize),
    /// The phase aborted; nothing further can be said about its keys.
    Fatal(AdmError),
}

impl PhaseOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, PhaseOutcome::Fatal(_))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, PhaseOutcome::Complete)
    }

    fn from_failed_count(failed: usize) -> Self {
        if failed == 0 {
            PhaseOutcome::Complete
        } else {
            PhaseOutcome::Partial(failed)
        }
    }
}

impl std::fmt::Display for PhaseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseOutcome::Complete => write!(f, "complete"),
            PhaseOutcome::Partial(n) => write!(f, "partial, {n} keys quarantined"),
            PhaseOutcome::Fatal(e) => write!(f, "fatal: {e}"),
        }
    }
}

/// What a run did, for the run report and the exit code.
#[derive(Debug)]
pub struct RunSummary {
    pub uuids: usize,
    pub metadata: PhaseOutcome,
    pub timeseries: PhaseOutcome,
    pub chunks: usize,
    pub quarantined: usize,
}

impl RunSummary {
    pub fn is_fatal(&self) -> bool {
        self.metadata.is_fatal() || self.timeseries.is_fatal()
    }
}

/// The pipeline orchestrator. All collaborators are injected; the
/// orchestrator owns only sequencing, progress discipline, and failure
/// routing.
pub struct Migrator {
    reader: Arc<dyn SourceReader>,
    writer: Arc<dyn SinkWriter>,
    journal: Arc<dyn ProgressJournal>,
    resources: Arc<ResourceManager>,
    options: MigratorOptions,
}

impl Migrator {
    pub fn new(
        reader: Arc<dyn SourceReader>,
        writer: Arc<dyn SinkWriter>,
        journal: Arc<dyn ProgressJournal>,
        resources: Arc<ResourceManager>,
        options: MigratorOptions,
    ) -> Self {
        Self {
            reader,
            writer,
            journal,
            resources,
            options,
        }
    }

    /// Runs the full pipeline. `Err` means setup or enumeration failed;
    /// per-phase failures are reported through the summary instead so one
    /// phase's death never stops the other.
    pub async fn run(&self) -> Result<RunSummary, AdmError> {
        let uuids = self.enumerate().await?;
        self.write_uuid_archive(&uuids).await?;

        let (quarantine, quarantine_task) =
            QuarantineWriter::spawn(self.options.quarantine_dest.clone());

        let (metadata, (timeseries, chunks)) = tokio::join!(
            self.run_metadata_phase(&uuids, &quarantine),
            self.run_timeseries_phase(&uuids, &quarantine),
        );

        drop(quarantine);
        let quarantined = join_supervised(quarantine_task).await?;

        Ok(RunSummary {
            uuids: uuids.len(),
            metadata,
            timeseries,
            chunks,
            quarantined,
        })
    }

    /// Step 1: the UUID population, fetched once per archive lifetime.
    async fn enumerate(&self) -> Result<Vec<String>, AdmError> {
        if self.journal.run_state(RunState::UuidsFetched).await?
            == Some(JournalStatus::WriteComplete)
        {
            let uuids = self.journal.metadata_uuids().await?;
            info!(count = uuids.len(), "uuid population loaded from journal");
            return Ok(uuids);
        }

        let uuids = dedup_preserving_order(self.reader.read_uuids().await?);
        for uuid in &uuids {
            self.journal
                .set_metadata_status(uuid, JournalStatus::NotStarted)
                .await?;
        }
        self.journal
            .set_run_state(RunState::UuidsFetched, JournalStatus::WriteComplete)
            .await?;
        info!(count = uuids.len(), "uuid population fetched");
        Ok(uuids)
    }

    async fn write_uuid_archive(&self, uuids: &[String]) -> Result<(), AdmError> {
        if self.journal.run_state(RunState::UuidsWritten).await?
            == Some(JournalStatus::WriteComplete)
        {
            return Ok(());
        }
        self.writer
            .write_uuids(&self.options.uuid_dest, uuids)
            .await?;
        self.journal
            .set_run_state(RunState::UuidsWritten, JournalStatus::WriteComplete)
            .await
    }

    async fn run_metadata_phase(
        &self,
        uuids: &[String],
        quarantine: &QuarantineHandle,
    ) -> PhaseOutcome {
        match self.metadata_phase(uuids, quarantine).await {
            Ok(failed) => PhaseOutcome::from_failed_count(failed),
            Err(e) => {
                error!(error = %e, "metadata phase failed");
                PhaseOutcome::Fatal(e)
            }
        }
    }

    async fn metadata_phase(
        &self,
        uuids: &[String],
        quarantine: &QuarantineHandle,
    ) -> Result<usize, AdmError> {
        if self.journal.run_state(RunState::MetadataWritten).await?
            == Some(JournalStatus::WriteComplete)
        {
            info!("metadata already written, skipping phase");
            return Ok(0);
        }

        let mut pending = Vec::new();
        for uuid in uuids {
            if self.journal.metadata_status(uuid).await? != Some(JournalStatus::WriteComplete) {
                pending.push(uuid.clone());
            }
        }
        if pending.is_empty() {
            self.journal
                .set_run_state(RunState::MetadataWritten, JournalStatus::WriteComplete)
                .await?;
            return Ok(0);
        }
        for uuid in &pending {
            self.journal
                .set_metadata_status(uuid, JournalStatus::WriteStart)
                .await?;
        }
        info!(pending = pending.len(), "metadata phase started");

        let _permits = self.resources.acquire_channel_pair().await?;
        let (tx, rx) = mpsc::channel(self.options.channel_buffer);

        let reader = Arc::clone(&self.reader);
        let reader_uuids = pending.clone();
        let reader_task = spawn_supervised("metadata-reader", async move {
            reader.read_metadata(&reader_uuids, tx).await
        });

        let writer = Arc::clone(&self.writer);
        let dest = self.options.metadata_dest.clone();
        let writer_task =
            spawn_supervised("metadata-writer", async move { writer.write_metadata(&dest, rx).await });

        // join both before propagating: the pair permits must outlive
        // both tasks, and either side may have ended the other
        let read_result = join_supervised(reader_task).await;
        let write_result = join_supervised(writer_task).await;
        let read_report = read_result?;
        let write_report = write_result?;

        for uuid in &write_report.written {
            self.journal
                .set_metadata_status(uuid, JournalStatus::WriteComplete)
                .await?;
        }

        let failed = read_report.failed.len() + write_report.failed.len();
        quarantine.report_all(read_report.failed);
        quarantine.report_all(write_report.failed);

        if failed == 0 {
            self.journal
                .set_run_state(RunState::MetadataWritten, JournalStatus::WriteComplete)
                .await?;
        }
        info!(failed, "metadata phase finished");
        Ok(failed)
    }

    async fn run_timeseries_phase(
        &self,
        uuids: &[String],
        quarantine: &QuarantineHandle,
    ) -> (PhaseOutcome, usize) {
        match self.timeseries_phase(uuids, quarantine).await {
            Ok((failed, chunks)) => (PhaseOutcome::from_failed_count(failed), chunks),
            Err(e) => {
                error!(error = %e, "timeseries phase failed");
                (PhaseOutcome::Fatal(e), 0)
            }
        }
    }

    async fn timeseries_phase(
        &self,
        uuids: &[String],
        quarantine: &QuarantineHandle,
    ) -> Result<(usize, usize), AdmError> {
        if self.journal.run_state(RunState::TimeseriesWritten).await?
            == Some(JournalStatus::WriteComplete)
        {
            info!("timeseries already written, skipping phase");
            return Ok((0, 0));
        }

        let (windows, window_failures) = self.collect_windows(uuids, quarantine).await?;

        let mut packer = ChunkPacker::new(self.options.chunk_size);
        let mut chunk_tasks: Vec<JoinHandle<AdmResult<usize>>> = Vec::new();

        for window in &windows {
            for slot in window.time_slots() {
                if self.journal.timeseries_status(&slot).await?
                    == Some(JournalStatus::WriteComplete)
                {
                    continue;
                }
                if slot.count() == 0 {
                    // nothing to fetch for an empty range
                    self.journal
                        .set_timeseries_status(&slot, JournalStatus::WriteComplete)
                        .await?;
                    continue;
                }
                self.journal
                    .set_timeseries_status(&slot, JournalStatus::WriteStart)
                    .await?;
                if let Some(chunk) = packer.push(slot) {
                    let index = chunk_tasks.len();
                    chunk_tasks.push(self.spawn_chunk(index, chunk, quarantine));
                }
            }
        }
        if let Some(chunk) = packer.finish() {
            let index = chunk_tasks.len();
            chunk_tasks.push(self.spawn_chunk(index, chunk, quarantine));
        }

        let chunks = chunk_tasks.len();
        info!(chunks, "all chunks scheduled");

        let mut failed = window_failures;
        let mut fatal: Option<AdmError> = None;
        for joined in futures::future::join_all(chunk_tasks).await {
            match joined {
                Ok(Ok(chunk_failed)) => failed += chunk_failed,
                Ok(Err(e)) => fatal = fatal.or(Some(e)),
                Err(e) => {
                    fatal = fatal.or(Some(AdmError::internal(format!(
                        "chunk task join failed: {e}"
                    ))));
                }
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        if failed == 0 {
            self.journal
                .set_run_state(RunState::TimeseriesWritten, JournalStatus::WriteComplete)
                .await?;
        }
        info!(failed, chunks, "timeseries phase finished");
        Ok((failed, chunks))
    }

    /// Sub-phase T1: one density window per stream, fanned out over UUID
    /// ranges sized from current semaphore occupancy.
    async fn collect_windows(
        &self,
        uuids: &[String],
        quarantine: &QuarantineHandle,
    ) -> Result<(Vec<Window>, usize), AdmError> {
        if self.journal.run_state(RunState::WindowsFetched).await?
            == Some(JournalStatus::WriteComplete)
        {
            let windows = self.journal.windows().await?;
            info!(count = windows.len(), "windows loaded from journal");
            return Ok((windows, 0));
        }

        if uuids.is_empty() {
            self.journal
                .set_run_state(RunState::WindowsFetched, JournalStatus::WriteComplete)
                .await?;
            return Ok((Vec::new(), 0));
        }

        let range_size = self.resources.min_free().max(1);
        let (tx, mut rx) = mpsc::channel::<Window>(uuids.len());

        let mut range_tasks = Vec::new();
        for range in uuids.chunks(range_size) {
            let reader = Arc::clone(&self.reader);
            let resources = Arc::clone(&self.resources);
            let range: Vec<String> = range.to_vec();
            let tx = tx.clone();
            range_tasks.push(spawn_supervised("window-range", async move {
                let _permit = resources.acquire_task().await?;
                let report = reader.read_windows(&range).await?;
                for window in report.windows {
                    if tx.send(window).await.is_err() {
                        return Err(AdmError::internal("window channel closed by consumer"));
                    }
                }
                Ok(report.failed)
            }));
        }
        drop(tx);

        // collect concurrently with the producers, deduplicating across
        // ranges and persisting each window for later resumption
        let journal = Arc::clone(&self.journal);
        let collector: JoinHandle<AdmResult<Vec<Window>>> =
            spawn_supervised("window-collector", async move {
                let mut seen = HashSet::new();
                let mut windows = Vec::new();
                while let Some(window) = rx.recv().await {
                    if !seen.insert(window.uuid().to_string()) {
                        debug!(uuid = window.uuid(), "duplicate window suppressed");
                        continue;
                    }
                    journal.put_window(&window).await?;
                    windows.push(window);
                }
                Ok(windows)
            });

        let mut failed_keys = Vec::new();
        let mut fatal: Option<AdmError> = None;
        for joined in futures::future::join_all(range_tasks).await {
            match joined {
                Ok(Ok(task_failed)) => failed_keys.extend(task_failed),
                Ok(Err(e)) => fatal = fatal.or(Some(e)),
                Err(e) => {
                    fatal = fatal.or(Some(AdmError::internal(format!(
                        "window task join failed: {e}"
                    ))));
                }
            }
        }
        let windows = join_supervised(collector).await?;
        if let Some(e) = fatal {
            return Err(e);
        }

        let failures = failed_keys.len();
        quarantine.report_all(failed_keys);
        if failures == 0 {
            self.journal
                .set_run_state(RunState::WindowsFetched, JournalStatus::WriteComplete)
                .await?;
        }
        info!(windows = windows.len(), failures, "windows collected");
        Ok((windows, failures))
    }

    /// Sub-phase T2, per chunk: a fresh destination and a reader/writer
    /// pair on a bounded channel. Permits are claimed inside the task so
    /// emission never blocks planning; the semaphores bound how many
    /// chunks are actually in flight.
    fn spawn_chunk(
        &self,
        index: usize,
        chunk: Chunk,
        quarantine: &QuarantineHandle,
    ) -> JoinHandle<AdmResult<usize>> {
        let reader = Arc::clone(&self.reader);
        let writer = Arc::clone(&self.writer);
        let journal = Arc::clone(&self.journal);
        let resources = Arc::clone(&self.resources);
        let dest = chunk_destination(&self.options.timeseries_dest, index);
        let buffer = self.options.channel_buffer;
        let quarantine = quarantine.clone();

        spawn_supervised("timeseries-chunk", async move {
            debug!(chunk = index, slots = chunk.len(), dest = %dest.display(), "chunk started");
            let _permits = resources.acquire_channel_pair().await?;
            let (tx, rx) = mpsc::channel(buffer);

            let slots: Vec<TimeSlot> = chunk.into_slots();
            let reader_slots = slots.clone();
            let reader_task = spawn_supervised("chunk-reader", async move {
                reader.read_timeseries(&reader_slots, tx).await
            });
            let writer_task = spawn_supervised("chunk-writer", async move {
                writer.write_timeseries(&dest, rx).await
            });

            let read_result = join_supervised(reader_task).await;
            let write_result = join_supervised(writer_task).await;
            let read_report = read_result?;
            let write_report = write_result?;

            for slot in &write_report.written {
                journal
                    .set_timeseries_status(slot, JournalStatus::WriteComplete)
                    .await?;
            }

            let failed = read_report.failed.len() + write_report.failed.len();
            quarantine.report_all(read_report.failed);
            quarantine.report_all(write_report.failed);
            debug!(chunk = index, failed, "chunk finished");
            Ok(failed)
        })
    }
}

fn dedup_preserving_order(uuids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    uuids
        .into_iter()
        .filter(|uuid| seen.insert(uuid.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserving_order() {
        let input = vec!["b", "a", "b", "c", "a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedup_preserving_order(input), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_phase_outcome_from_failed_count() {
        assert!(PhaseOutcome::from_failed_count(0).is_complete());
        assert!(matches!(
            PhaseOutcome::from_failed_count(3),
            PhaseOutcome::Partial(3)
        ));
    }

    #[test]
    fn test_phase_outcome_display() {
        assert_eq!(PhaseOutcome::Complete.to_string(), "complete");
        assert_eq!(
            PhaseOutcome::Partial(2).to_string(),
            "partial, 2 keys quarantined"
        );
        assert!(PhaseOutcome::Fatal(AdmError::transport("x"))
            .to_string()
            .starts_with("fatal:"));
    }
}
