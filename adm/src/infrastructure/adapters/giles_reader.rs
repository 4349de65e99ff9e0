// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Giles Query Reader
//!
//! [`GilesReader`] implements the [`SourceReader`] port against the Giles
//! query dialect:
//!
//! - `select distinct uuid` enumerates the stream population;
//! - `select window(365d) data in (0, now) where uuid = '<id>' [or uuid = '<id>']...`
//!   fetches one-year density histograms;
//! - `select * where uuid = '<id>' [or ...]` fetches metadata payloads;
//! - `select data in (<start>ns, <end>ns) as ns where uuid='<id>'` (or
//!   `(<start>ns, now)`) fetches one slot's sample range.
//!
//! Window and metadata fetches are batched (10 UUIDs per query). When a
//! batched query fails, the reader falls back to one query per UUID of
//! that batch, keeps the individual successes, and reports the individual
//! failures as failed keys. Time-series is never batched across slots: a
//! single slot can already be arbitrarily large.
//!
//! Responses are decoded just far enough to validate structure; payload
//! bytes travel to the writer verbatim. Duplicate windows by UUID are
//! suppressed, first wins.
//!
//! Channel discipline: this reader is the sole producer of the tuples it
//! sends and closes the channel by dropping the sender on every return
//! path. A send failing means the consumer dropped its end on a fatal
//! error, which this reader surfaces as fatal too.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};

use adm_domain::repositories::{ReadReport, SourceReader, WindowsRead};
use adm_domain::value_objects::{MetadataTuple, Reading, TimeSlot, TimeseriesTuple, Window};
use adm_domain::{AdmError, FailedKey};

use super::query_transport::QueryExec;

/// UUIDs per batched window query.
pub const WINDOW_BATCH_SIZE: usize = 10;
/// UUIDs per batched metadata query.
pub const METADATA_BATCH_SIZE: usize = 10;

/// Wire shape of one window in a Giles histogram response. Each reading
/// is an array whose first two elements are the bucket start (ns) and the
/// sample count; trailing elements are ignored.
#[derive(Debug, serde::Deserialize)]
struct WireWindow {
    uuid: String,
    #[serde(rename = "Readings", default)]
    readings: Vec<Vec<i64>>,
}

impl WireWindow {
    fn into_window(self) -> Result<Window, AdmError> {
        let readings = self
            .readings
            .iter()
            .map(|r| match (r.first(), r.get(1)) {
                (Some(&start), Some(&count)) => Ok(Reading::new(start, count)),
                _ => Err(AdmError::decode(format!(
                    "window reading for {} has {} fields, expected at least 2",
                    self.uuid,
                    r.len()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Window::new(self.uuid, readings))
    }
}

/// Reader over the remote query service.
pub struct GilesReader {
    transport: Arc<dyn QueryExec>,
}

impl GilesReader {
    pub fn new(transport: Arc<dyn QueryExec>) -> Self {
        Self { transport }
    }

    fn batch_clause(uuids: &[String]) -> String {
        let quoted: Vec<String> = uuids.iter().map(|u| format!("'{u}'")).collect();
        quoted.join(" or uuid = ")
    }

    fn window_query(uuids: &[String]) -> String {
        format!(
            "select window(365d) data in (0, now) where uuid = {}",
            Self::batch_clause(uuids)
        )
    }

    fn metadata_query(uuids: &[String]) -> String {
        format!("select * where uuid = {}", Self::batch_clause(uuids))
    }

    fn timeseries_query(slot: &TimeSlot) -> String {
        let start = format!("{}ns", slot.start_time_ns());
        let end = if slot.is_open_ended() {
            "now".to_string()
        } else {
            format!("{}ns", slot.end_time_ns())
        };
        format!(
            "select data in ({start}, {end}) as ns where uuid='{}'",
            slot.uuid()
        )
    }

    fn decode_windows(body: &[u8]) -> Result<Vec<Window>, AdmError> {
        let wire: Vec<WireWindow> = serde_json::from_slice(body)?;
        wire.into_iter().map(WireWindow::into_window).collect()
    }

    async fn read_windows_batched(&self, uuids: &[String]) -> Result<Vec<Window>, AdmError> {
        let body = self.transport.query(&Self::window_query(uuids)).await?;
        Self::decode_windows(&body)
    }

    async fn read_window(&self, uuid: &str) -> Result<Window, AdmError> {
        let single = [uuid.to_string()];
        let body = self.transport.query(&Self::window_query(&single)).await?;
        Self::decode_windows(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| AdmError::decode(format!("empty window response for {uuid}")))
    }

    /// Validates the payload is a JSON array of records, then hands the
    /// raw bytes back for verbatim archival.
    async fn read_metadata_batched(&self, uuids: &[String]) -> Result<Vec<u8>, AdmError> {
        let body = self.transport.query(&Self::metadata_query(uuids)).await?;
        let _: Vec<serde_json::Value> = serde_json::from_slice(&body)?;
        Ok(body)
    }

    async fn read_slot(&self, slot: &TimeSlot) -> Result<Vec<u8>, AdmError> {
        let body = self.transport.query(&Self::timeseries_query(slot)).await?;
        let _: Vec<serde_json::Value> = serde_json::from_slice(&body)?;
        Ok(body)
    }

    fn push_window(result: &mut WindowsRead, seen: &mut HashSet<String>, window: Window) {
        if seen.insert(window.uuid().to_string()) {
            result.windows.push(window);
        } else {
            debug!(uuid = window.uuid(), "duplicate window suppressed");
        }
    }
}

#[async_trait]
impl SourceReader for GilesReader {
    async fn read_uuids(&self) -> Result<Vec<String>, AdmError> {
        let body = self.transport.query("select distinct uuid").await?;
        let uuids: Vec<String> = serde_json::from_slice(&body)
            .map_err(|e| AdmError::decode(format!("could not decode uuid listing: {e}")))?;
        info!(count = uuids.len(), "uuid enumeration complete");
        Ok(uuids)
    }

    async fn read_windows(&self, uuids: &[String]) -> Result<WindowsRead, AdmError> {
        let mut result = WindowsRead::default();
        let mut seen = HashSet::new();
        info!(uuids = uuids.len(), "reading windows");

        for batch in uuids.chunks(WINDOW_BATCH_SIZE) {
            match self.read_windows_batched(batch).await {
                Ok(windows) => {
                    for window in windows {
                        Self::push_window(&mut result, &mut seen, window);
                    }
                }
                Err(e) => {
                    warn!(error = %e, batch = batch.len(), "batched window read failed, retrying per uuid");
                    for uuid in batch {
                        match self.read_window(uuid).await {
                            Ok(window) => Self::push_window(&mut result, &mut seen, window),
                            Err(e) => {
                                warn!(uuid = %uuid, error = %e, "window read failed");
                                result.failed.push(FailedKey::Window(uuid.clone()));
                            }
                        }
                    }
                }
            }
        }

        info!(
            windows = result.windows.len(),
            failed = result.failed.len(),
            "window read complete"
        );
        Ok(result)
    }

    async fn read_metadata(
        &self,
        uuids: &[String],
        out: Sender<MetadataTuple>,
    ) -> Result<ReadReport, AdmError> {
        let mut report = ReadReport::default();

        for batch in uuids.chunks(METADATA_BATCH_SIZE) {
            match self.read_metadata_batched(batch).await {
                Ok(body) => {
                    send(&out, MetadataTuple::new(batch.to_vec(), body)).await?;
                }
                Err(e) => {
                    warn!(error = %e, batch = batch.len(), "batched metadata read failed, retrying per uuid");
                    for uuid in batch {
                        match self.read_metadata_batched(&[uuid.clone()]).await {
                            Ok(body) => {
                                send(&out, MetadataTuple::new(vec![uuid.clone()], body)).await?;
                            }
                            Err(e) => {
                                warn!(uuid = %uuid, error = %e, "metadata read failed");
                                report.failed.push(FailedKey::Metadata(uuid.clone()));
                            }
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    async fn read_timeseries(
        &self,
        slots: &[TimeSlot],
        out: Sender<TimeseriesTuple>,
    ) -> Result<ReadReport, AdmError> {
        let mut report = ReadReport::default();

        for slot in slots {
            debug!(
                uuid = slot.uuid(),
                start = slot.start_time_ns(),
                end = slot.end_time_ns(),
                "reading slot"
            );
            match self.read_slot(slot).await {
                Ok(body) => {
                    send(&out, TimeseriesTuple::new(slot.clone(), body)).await?;
                }
                Err(e) => {
                    warn!(uuid = slot.uuid(), error = %e, "slot read failed");
                    report.failed.push(FailedKey::Timeseries(slot.clone()));
                }
            }
        }

        Ok(report)
    }
}

async fn send<T: Send>(out: &Sender<T>, value: T) -> Result<(), AdmError> {
    out.send(value)
        .await
        .map_err(|_| AdmError::internal("payload channel closed by consumer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ScriptedExec<F>
    where
        F: Fn(&str) -> Result<Vec<u8>, AdmError> + Send + Sync,
    {
        respond: F,
    }

    #[async_trait]
    impl<F> QueryExec for ScriptedExec<F>
    where
        F: Fn(&str) -> Result<Vec<u8>, AdmError> + Send + Sync,
    {
        async fn query(&self, body: &str) -> Result<Vec<u8>, AdmError> {
            (self.respond)(body)
        }
    }

    fn reader_with<F>(respond: F) -> GilesReader
    where
        F: Fn(&str) -> Result<Vec<u8>, AdmError> + Send + Sync + 'static,
    {
        GilesReader::new(Arc::new(ScriptedExec { respond }))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_window_query_composition() {
        let query = GilesReader::window_query(&strings(&["a", "b"]));
        assert_eq!(
            query,
            "select window(365d) data in (0, now) where uuid = 'a' or uuid = 'b'"
        );
    }

    #[test]
    fn test_metadata_query_single_clause() {
        let query = GilesReader::metadata_query(&strings(&["a"]));
        assert_eq!(query, "select * where uuid = 'a'");
    }

    #[test]
    fn test_timeseries_query_bounds() {
        let bounded = TimeSlot::new("u", 0, 100, 5);
        assert_eq!(
            GilesReader::timeseries_query(&bounded),
            "select data in (0ns, 100ns) as ns where uuid='u'"
        );

        let open = TimeSlot::new("u", 100, -1, 5);
        assert_eq!(
            GilesReader::timeseries_query(&open),
            "select data in (100ns, now) as ns where uuid='u'"
        );
    }

    #[tokio::test]
    async fn test_read_uuids() {
        let reader = reader_with(|query| {
            assert_eq!(query, "select distinct uuid");
            Ok(br#"["a","b","c"]"#.to_vec())
        });
        assert_eq!(reader.read_uuids().await.unwrap(), strings(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_read_uuids_decode_failure_is_fatal() {
        let reader = reader_with(|_| Ok(b"not json".to_vec()));
        let err = reader.read_uuids().await.unwrap_err();
        assert!(matches!(err, AdmError::Decode(_)));
    }

    #[tokio::test]
    async fn test_read_windows_batched_with_extra_reading_fields() {
        let reader = reader_with(|_| {
            Ok(br#"[{"uuid":"a","Readings":[[0,5,99],[10,7]]},{"uuid":"b","Readings":[]}]"#.to_vec())
        });

        let result = reader.read_windows(&strings(&["a", "b"])).await.unwrap();
        assert!(result.is_clean());
        assert_eq!(result.windows.len(), 2);
        assert_eq!(
            result.windows[0].readings(),
            &[Reading::new(0, 5), Reading::new(10, 7)]
        );
        assert!(result.windows[1].readings().is_empty());
    }

    #[tokio::test]
    async fn test_read_windows_suppresses_duplicates_first_wins() {
        let reader = reader_with(|_| {
            Ok(br#"[{"uuid":"a","Readings":[[0,1]]},{"uuid":"a","Readings":[[0,9]]}]"#.to_vec())
        });

        let result = reader.read_windows(&strings(&["a"])).await.unwrap();
        assert_eq!(result.windows.len(), 1);
        assert_eq!(result.windows[0].readings(), &[Reading::new(0, 1)]);
    }

    #[tokio::test]
    async fn test_read_windows_falls_back_per_uuid() {
        // the batched query (more than one clause) fails; singles mostly work
        let reader = reader_with(|query| {
            if query.contains(" or uuid = ") {
                return Err(AdmError::transport("batch refused"));
            }
            if query.contains("'bad'") {
                return Err(AdmError::transport("bad uuid"));
            }
            if query.contains("'a'") {
                Ok(br#"[{"uuid":"a","Readings":[[0,5]]}]"#.to_vec())
            } else {
                Ok(br#"[{"uuid":"c","Readings":[[0,2]]}]"#.to_vec())
            }
        });

        let result = reader
            .read_windows(&strings(&["a", "bad", "c"]))
            .await
            .unwrap();
        assert_eq!(result.windows.len(), 2);
        assert_eq!(
            result.failed,
            vec![FailedKey::Window("bad".to_string())]
        );
    }

    #[tokio::test]
    async fn test_read_metadata_batch_sends_one_tuple() {
        let uuids = strings(&["a", "b"]);
        let reader = reader_with(|_| Ok(br#"[{"uuid":"a"},{"uuid":"b"}]"#.to_vec()));

        let (tx, mut rx) = mpsc::channel(10);
        let report = reader.read_metadata(&uuids, tx).await.unwrap();
        assert!(report.is_clean());

        let tuple = rx.recv().await.expect("one tuple");
        assert_eq!(tuple.uuids(), &["a".to_string(), "b".to_string()]);
        assert_eq!(tuple.data(), br#"[{"uuid":"a"},{"uuid":"b"}]"#);
        assert!(rx.recv().await.is_none(), "channel closed after read");
    }

    #[tokio::test]
    async fn test_read_metadata_falls_back_per_uuid() {
        let reader = reader_with(|query| {
            if query.contains(" or uuid = ") {
                return Err(AdmError::transport("batch refused"));
            }
            if query.contains("'bad'") {
                return Ok(b"not json".to_vec());
            }
            Ok(br#"[{"uuid":"one"}]"#.to_vec())
        });

        let (tx, mut rx) = mpsc::channel(10);
        let report = reader
            .read_metadata(&strings(&["a", "bad", "c"]), tx)
            .await
            .unwrap();
        assert_eq!(report.failed, vec![FailedKey::Metadata("bad".to_string())]);

        let mut tuples = Vec::new();
        while let Some(tuple) = rx.recv().await {
            tuples.push(tuple);
        }
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0].uuids(), &["a".to_string()]);
        assert_eq!(tuples[1].uuids(), &["c".to_string()]);
    }

    #[tokio::test]
    async fn test_read_timeseries_reports_bad_payloads() {
        let reader = reader_with(|query| {
            if query.contains("'bad'") {
                Ok(b"<html>garbage</html>".to_vec())
            } else {
                Ok(br#"[{"uuid":"a","Readings":[[1,2]]}]"#.to_vec())
            }
        });

        let slots = vec![
            TimeSlot::new("a", 0, 100, 5),
            TimeSlot::new("bad", 100, -1, 2),
        ];
        let (tx, mut rx) = mpsc::channel(10);
        let report = reader.read_timeseries(&slots, tx).await.unwrap();

        assert_eq!(
            report.failed,
            vec![FailedKey::Timeseries(slots[1].clone())]
        );
        let tuple = rx.recv().await.expect("good slot tuple");
        assert_eq!(tuple.slot(), &slots[0]);
        assert!(rx.recv().await.is_none());
    }
}
