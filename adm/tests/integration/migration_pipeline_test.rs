// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end runs against a scripted source: chunk assignment, archive
//! file shapes, run-state transitions, and failure quarantine.

use crate::common::{Harness, MockSource};

use adm::application::services::PhaseOutcome;
use adm_domain::repositories::ProgressJournal;
use adm_domain::value_objects::{JournalStatus, RunState, TimeSlot};

const YEAR_NS: i64 = 31_536_000_000_000_000;

#[tokio::test]
async fn test_minimal_single_stream() {
    let source = MockSource::new(&["A"]).with_window("A", &[(0, 5)]);
    let harness = Harness::new(source, 10).await;

    let summary = harness.migrator.run().await.expect("run");

    assert!(summary.metadata.is_complete());
    assert!(summary.timeseries.is_complete());
    assert_eq!(summary.uuids, 1);
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.quarantined, 0);

    assert_eq!(harness.file("uuids.json").await, r#"["A"]"#);
    assert_eq!(harness.file("metadata.json").await, "[m[A]]");
    assert_eq!(harness.file("ts0.json").await, "[t[A:0:-1]]");
    assert_eq!(harness.file("quarantine.log").await, "");

    for key in RunState::ALL {
        assert_eq!(
            harness.journal.run_state(key).await.unwrap(),
            Some(JournalStatus::WriteComplete),
            "run state {key:?} should be complete"
        );
    }
}

#[tokio::test]
async fn test_exact_threshold_packs_both_slots_into_one_chunk() {
    let source = MockSource::new(&["A", "B"])
        .with_window("A", &[(0, 6)])
        .with_window("B", &[(0, 4)]);
    let harness = Harness::new(source, 10).await;

    let summary = harness.migrator.run().await.expect("run");

    assert_eq!(summary.chunks, 1);
    assert_eq!(
        harness.file("ts0.json").await,
        "[t[A:0:-1],t[B:0:-1]]",
        "cumulative count reaches the threshold exactly at B"
    );
    assert!(!harness.file_exists("ts1.json").await);
}

#[tokio::test]
async fn test_multi_chunk_assignment() {
    let source = MockSource::new(&["A", "B", "C"])
        .with_window("A", &[(0, 7)])
        .with_window("B", &[(0, 8)])
        .with_window("C", &[(0, 3)]);
    let harness = Harness::new(source, 10).await;

    let summary = harness.migrator.run().await.expect("run");

    assert_eq!(summary.chunks, 2);
    assert_eq!(harness.file("ts0.json").await, "[t[A:0:-1],t[B:0:-1]]");
    assert_eq!(harness.file("ts1.json").await, "[t[C:0:-1]]");
    assert!(summary.timeseries.is_complete());
}

#[tokio::test]
async fn test_empty_population_completes_both_phases() {
    let harness = Harness::new(MockSource::new(&[]), 10).await;

    let summary = harness.migrator.run().await.expect("run");

    assert!(summary.metadata.is_complete());
    assert!(summary.timeseries.is_complete());
    assert_eq!(summary.chunks, 0);
    assert_eq!(harness.file("uuids.json").await, "[]");
    assert!(!harness.file_exists("ts0.json").await);

    assert_eq!(
        harness
            .journal
            .run_state(RunState::TimeseriesWritten)
            .await
            .unwrap(),
        Some(JournalStatus::WriteComplete)
    );
}

#[tokio::test]
async fn test_zero_count_slots_complete_without_fetching() {
    let source = MockSource::new(&["A"]).with_window(
        "A",
        &[(0, 0), (YEAR_NS, 0), (2 * YEAR_NS, 3)],
    );
    let harness = Harness::new(source, 10).await;

    let summary = harness.migrator.run().await.expect("run");
    assert!(summary.timeseries.is_complete());

    // only the non-empty slot was ever fetched
    let read = harness.source.slots_read();
    assert_eq!(read, vec![TimeSlot::new("A", 2 * YEAR_NS, -1, 3)]);

    // the empty slots were journaled complete anyway
    for slot in [
        TimeSlot::new("A", 0, YEAR_NS, 0),
        TimeSlot::new("A", YEAR_NS, 2 * YEAR_NS, 0),
    ] {
        assert_eq!(
            harness.journal.timeseries_status(&slot).await.unwrap(),
            Some(JournalStatus::WriteComplete)
        );
    }

    assert_eq!(
        harness.file("ts0.json").await,
        format!("[t[A:{}:-1]]", 2 * YEAR_NS)
    );
}

#[tokio::test]
async fn test_partial_metadata_batch_quarantines_and_holds_run_state() {
    let uuids = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];
    let source = MockSource::new(&uuids).fail_metadata_for("E");
    let harness = Harness::new(source, 10).await;

    let summary = harness.migrator.run().await.expect("run");

    assert!(matches!(summary.metadata, PhaseOutcome::Partial(1)));
    assert_eq!(summary.quarantined, 1);

    // batch fell back to singles; nine streams made it through
    assert_eq!(
        harness.file("metadata.json").await,
        "[m[A],m[B],m[C],m[D],m[F],m[G],m[H],m[I],m[J]]"
    );
    assert_eq!(harness.file("quarantine.log").await, "E metadata 0 0\n");

    // the failed key stays short of complete, the rest are done
    assert_eq!(
        harness.journal.metadata_status("E").await.unwrap(),
        Some(JournalStatus::WriteStart)
    );
    assert_eq!(
        harness.journal.metadata_status("A").await.unwrap(),
        Some(JournalStatus::WriteComplete)
    );
    assert_ne!(
        harness
            .journal
            .run_state(RunState::MetadataWritten)
            .await
            .unwrap(),
        Some(JournalStatus::WriteComplete)
    );
}

#[tokio::test]
async fn test_window_failure_quarantines_and_holds_timeseries_state() {
    let source = MockSource::new(&["A", "B"])
        .with_window("A", &[(0, 5)])
        .fail_window_for("B");
    let harness = Harness::new(source, 10).await;

    let summary = harness.migrator.run().await.expect("run");

    assert!(matches!(summary.timeseries, PhaseOutcome::Partial(1)));
    assert_eq!(harness.file("quarantine.log").await, "B window 0 0\n");

    // A's data still landed
    assert_eq!(harness.file("ts0.json").await, "[t[A:0:-1]]");

    // neither the window sub-phase nor the whole phase may be marked done
    assert_ne!(
        harness
            .journal
            .run_state(RunState::WindowsFetched)
            .await
            .unwrap(),
        Some(JournalStatus::WriteComplete)
    );
    assert_ne!(
        harness
            .journal
            .run_state(RunState::TimeseriesWritten)
            .await
            .unwrap(),
        Some(JournalStatus::WriteComplete)
    );
}
