// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Resumption behavior: a completed run never re-reads, and an
//! interrupted run re-attempts exactly the keys that never finished.

use std::sync::atomic::Ordering;

use crate::common::{Harness, MockSource};

use adm::application::services::PhaseOutcome;
use adm_domain::repositories::ProgressJournal;
use adm_domain::value_objects::{JournalStatus, RunState, TimeSlot};

#[tokio::test]
async fn test_completed_run_resumes_with_zero_reads() {
    let source = MockSource::new(&["A", "B"])
        .with_window("A", &[(0, 5)])
        .with_window("B", &[(0, 7)]);
    let harness = Harness::new(source, 10).await;

    harness.migrator.run().await.expect("first run");

    let uuid_reads = harness.source.uuid_reads.load(Ordering::SeqCst);
    let window_calls = harness.source.window_calls.load(Ordering::SeqCst);
    let metadata_calls = harness.source.metadata_calls.load(Ordering::SeqCst);
    let slots_read = harness.source.slots_read().len();
    let ts0 = harness.file("ts0.json").await;

    let summary = harness.migrator.run().await.expect("second run");

    assert!(summary.metadata.is_complete());
    assert!(summary.timeseries.is_complete());
    assert_eq!(summary.chunks, 0, "nothing left to schedule");

    // the journal answered everything; the source saw no new queries
    assert_eq!(harness.source.uuid_reads.load(Ordering::SeqCst), uuid_reads);
    assert_eq!(
        harness.source.window_calls.load(Ordering::SeqCst),
        window_calls
    );
    assert_eq!(
        harness.source.metadata_calls.load(Ordering::SeqCst),
        metadata_calls
    );
    assert_eq!(harness.source.slots_read().len(), slots_read);

    // and the archive is untouched
    assert_eq!(harness.file("ts0.json").await, ts0);
    assert!(!harness.file_exists("ts1.json").await);
}

#[tokio::test]
async fn test_resume_after_slot_outage_refetches_only_failed_slot() {
    let source = MockSource::new(&["A", "B"])
        .with_window("A", &[(0, 4)])
        .with_window("B", &[(0, 9)])
        .fail_slots_for("B");
    let harness = Harness::new(source, 10).await;

    let first = harness.migrator.run().await.expect("first run");
    assert!(matches!(first.timeseries, PhaseOutcome::Partial(1)));

    let slot_a = TimeSlot::new("A", 0, -1, 4);
    let slot_b = TimeSlot::new("B", 0, -1, 9);
    assert_eq!(
        harness.journal.timeseries_status(&slot_a).await.unwrap(),
        Some(JournalStatus::WriteComplete)
    );
    assert_eq!(
        harness.journal.timeseries_status(&slot_b).await.unwrap(),
        Some(JournalStatus::WriteStart),
        "failed slot must stay short of complete"
    );
    assert_eq!(
        harness.file("quarantine.log").await,
        "B timeseries 0 -1\n"
    );

    // the outage clears; the next run picks up only B
    harness.source.heal_slots();
    let window_calls = harness.source.window_calls.load(Ordering::SeqCst);
    let slots_before = harness.source.slots_read().len();

    let second = harness.migrator.run().await.expect("second run");
    assert!(second.timeseries.is_complete());

    // windows came from the journal, and only B was fetched again
    assert_eq!(
        harness.source.window_calls.load(Ordering::SeqCst),
        window_calls
    );
    let refetched: Vec<TimeSlot> = harness.source.slots_read()[slots_before..].to_vec();
    assert_eq!(refetched, vec![slot_b.clone()]);

    assert_eq!(
        harness.journal.timeseries_status(&slot_b).await.unwrap(),
        Some(JournalStatus::WriteComplete)
    );
    assert_eq!(
        harness
            .journal
            .run_state(RunState::TimeseriesWritten)
            .await
            .unwrap(),
        Some(JournalStatus::WriteComplete)
    );

    // both payloads are in the chunk archive now
    let ts0 = harness.file("ts0.json").await;
    assert!(ts0.contains("t[A:0:-1]"));
    assert!(ts0.contains("t[B:0:-1]"));
}
