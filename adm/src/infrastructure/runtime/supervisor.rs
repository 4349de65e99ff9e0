// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Supervision Utilities
//!
//! Wrappers around `tokio::spawn` that log task lifecycle and convert
//! panics into typed errors, so no background failure is silent. Every
//! spawned handle must be awaited through [`join_supervised`].

use adm_domain::AdmError;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Result type alias for application operations
pub type AdmResult<T> = Result<T, AdmError>;

/// Spawns a supervised task with automatic error logging and lifecycle
/// tracking. The returned handle must be awaited by the caller.
pub fn spawn_supervised<F, T>(name: &'static str, fut: F) -> JoinHandle<AdmResult<T>>
where
    F: std::future::Future<Output = AdmResult<T>> + Send + 'static,
    T: Send + 'static,
{
    debug!(task = name, "task starting");

    tokio::spawn(async move {
        let result = fut.await;

        match &result {
            Ok(_) => debug!(task = name, "task completed"),
            Err(e) => error!(task = name, error = %e, "task failed"),
        }

        result
    })
}

/// Awaits a supervised task handle, converting panics and join failures
/// into [`AdmError`] while preserving the task's own error.
pub async fn join_supervised<T>(handle: JoinHandle<AdmResult<T>>) -> AdmResult<T> {
    match handle.await {
        Ok(task_result) => task_result,
        Err(e) if e.is_panic() => Err(AdmError::internal(format!("task panicked: {e}"))),
        Err(e) => Err(AdmError::internal(format!("task join failed: {e}"))),
    }
}
