// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Progress Journal
//!
//! [`SqliteJournal`] implements the [`ProgressJournal`] port over a single
//! database file (`adm.db`). One table holds every entry; the four logical
//! namespaces are folded into a `bucket` column:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS journal (
//!     bucket TEXT NOT NULL,          -- namespace
//!     key    TEXT NOT NULL,          -- entry key within the namespace
//!     value  TEXT NOT NULL,          -- status text or window JSON
//!     PRIMARY KEY (bucket, key)
//! );
//! ```
//!
//! Buckets: `run_state` (fixed phase keys), `window_data` (UUID to window
//! JSON), `uuid_m_status` (UUID to metadata status), `uuid_t_status`
//! (slot identity to time-series status, keyed `uuid:start:end:count`).
//!
//! ## Durability
//!
//! The pool opens with WAL journaling and FULL synchronous mode: each
//! upsert commits atomically and survives process crash, losing at most a
//! write that had not yet committed. Reads and writes may be issued
//! concurrently from any task; SQLite serializes writers to the same key.
//!
//! Opening seeds every missing run-state key to `not_started`. No other
//! key is seeded: a read of a never-written key returns `None`, which is
//! how callers distinguish "never seen" from "seen and not yet started".

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};

use adm_domain::repositories::ProgressJournal;
use adm_domain::value_objects::{JournalStatus, RunState, TimeSlot, Window};
use adm_domain::AdmError;

/// Journal file name, created in the working directory.
pub const DB_NAME: &str = "adm.db";

const RUN_STATE_BUCKET: &str = "run_state";
const WINDOW_BUCKET: &str = "window_data";
const UUID_METADATA_BUCKET: &str = "uuid_m_status";
const UUID_TIMESERIES_BUCKET: &str = "uuid_t_status";

/// Crash-safe keyed progress store on a single SQLite file.
#[derive(Debug)]
pub struct SqliteJournal {
    pool: SqlitePool,
}

impl SqliteJournal {
    /// Opens (creating if missing) the journal at `path`, ensures the
    /// schema, and seeds missing run-state keys.
    pub async fn open(path: &Path) -> Result<Self, AdmError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| AdmError::journal(format!("failed to open {}: {e}", path.display())))?;

        let journal = Self { pool };
        journal.ensure_schema().await?;
        journal.seed_run_state().await?;
        Ok(journal)
    }

    async fn ensure_schema(&self) -> Result<(), AdmError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS journal (
                bucket TEXT NOT NULL,
                key    TEXT NOT NULL,
                value  TEXT NOT NULL,
                PRIMARY KEY (bucket, key)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AdmError::journal(format!("failed to create journal table: {e}")))?;
        Ok(())
    }

    async fn seed_run_state(&self) -> Result<(), AdmError> {
        for key in RunState::ALL {
            if self.get(RUN_STATE_BUCKET, key.key()).await?.is_none() {
                self.put(
                    RUN_STATE_BUCKET,
                    key.key(),
                    JournalStatus::NotStarted.as_str(),
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<String>, AdmError> {
        let row = sqlx::query("SELECT value FROM journal WHERE bucket = ? AND key = ?")
            .bind(bucket)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AdmError::journal(format!("get {bucket}/{key}: {e}")))?;

        row.map(|r| {
            r.try_get::<String, _>(0)
                .map_err(|e| AdmError::journal(format!("get {bucket}/{key}: {e}")))
        })
        .transpose()
    }

    async fn put(&self, bucket: &str, key: &str, value: &str) -> Result<(), AdmError> {
        sqlx::query(
            "INSERT INTO journal (bucket, key, value) VALUES (?, ?, ?)
             ON CONFLICT (bucket, key) DO UPDATE SET value = excluded.value",
        )
        .bind(bucket)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| AdmError::journal(format!("put {bucket}/{key}: {e}")))?;
        Ok(())
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, AdmError> {
        let rows = sqlx::query("SELECT key FROM journal WHERE bucket = ? ORDER BY key")
            .bind(bucket)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AdmError::journal(format!("keys {bucket}: {e}")))?;

        rows.into_iter()
            .map(|r| {
                r.try_get::<String, _>(0)
                    .map_err(|e| AdmError::journal(format!("keys {bucket}: {e}")))
            })
            .collect()
    }

    async fn values(&self, bucket: &str) -> Result<Vec<String>, AdmError> {
        let rows = sqlx::query("SELECT value FROM journal WHERE bucket = ? ORDER BY key")
            .bind(bucket)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AdmError::journal(format!("entries {bucket}: {e}")))?;

        rows.into_iter()
            .map(|r| {
                r.try_get::<String, _>(0)
                    .map_err(|e| AdmError::journal(format!("entries {bucket}: {e}")))
            })
            .collect()
    }

    fn decode_status(value: Option<String>) -> Result<Option<JournalStatus>, AdmError> {
        value
            .map(|v| {
                JournalStatus::parse(&v)
                    .ok_or_else(|| AdmError::journal(format!("unknown status value: {v}")))
            })
            .transpose()
    }
}

#[async_trait]
impl ProgressJournal for SqliteJournal {
    async fn run_state(&self, key: RunState) -> Result<Option<JournalStatus>, AdmError> {
        Self::decode_status(self.get(RUN_STATE_BUCKET, key.key()).await?)
    }

    async fn set_run_state(&self, key: RunState, status: JournalStatus) -> Result<(), AdmError> {
        self.put(RUN_STATE_BUCKET, key.key(), status.as_str()).await
    }

    async fn metadata_status(&self, uuid: &str) -> Result<Option<JournalStatus>, AdmError> {
        Self::decode_status(self.get(UUID_METADATA_BUCKET, uuid).await?)
    }

    async fn set_metadata_status(
        &self,
        uuid: &str,
        status: JournalStatus,
    ) -> Result<(), AdmError> {
        self.put(UUID_METADATA_BUCKET, uuid, status.as_str()).await
    }

    async fn metadata_uuids(&self) -> Result<Vec<String>, AdmError> {
        self.keys(UUID_METADATA_BUCKET).await
    }

    async fn timeseries_status(&self, slot: &TimeSlot) -> Result<Option<JournalStatus>, AdmError> {
        Self::decode_status(self.get(UUID_TIMESERIES_BUCKET, &slot.journal_key()).await?)
    }

    async fn set_timeseries_status(
        &self,
        slot: &TimeSlot,
        status: JournalStatus,
    ) -> Result<(), AdmError> {
        self.put(UUID_TIMESERIES_BUCKET, &slot.journal_key(), status.as_str())
            .await
    }

    async fn window(&self, uuid: &str) -> Result<Option<Window>, AdmError> {
        self.get(WINDOW_BUCKET, uuid)
            .await?
            .map(|v| {
                serde_json::from_str(&v)
                    .map_err(|e| AdmError::journal(format!("corrupt window for {uuid}: {e}")))
            })
            .transpose()
    }

    async fn put_window(&self, window: &Window) -> Result<(), AdmError> {
        let value = serde_json::to_string(window)
            .map_err(|e| AdmError::journal(format!("encode window {}: {e}", window.uuid())))?;
        self.put(WINDOW_BUCKET, window.uuid(), &value).await
    }

    async fn windows(&self) -> Result<Vec<Window>, AdmError> {
        self.values(WINDOW_BUCKET)
            .await?
            .into_iter()
            .map(|v| {
                serde_json::from_str(&v)
                    .map_err(|e| AdmError::journal(format!("corrupt window entry: {e}")))
            })
            .collect()
    }
}
