// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Resource Manager
//!
//! Two counting semaphores govern the whole run: `workers` caps in-flight
//! logical tasks and `open_io` caps tasks holding I/O. A task that
//! performs I/O holds one permit from each; a pure coordination task holds
//! only a worker permit. Backpressure falls out naturally: when either
//! pool is saturated, new work waits.
//!
//! Permits are RAII guards. Dropping a permit is the only way to release
//! it, so every acquire is paired with exactly one release on every exit
//! path, including error paths, and a release without a matching acquire
//! cannot be expressed.
//!
//! ## Pair claims
//!
//! Each reader/writer channel pair claims its permits (2 workers + 2
//! open-IO) as one atomic `acquire_many` per semaphore, workers before
//! open-IO. Claiming per task instead deadlocks at small capacities: two
//! readers can take the last workers, fill their bounded channels, and
//! block sending while their writers starve behind them. The atomic claim
//! preserves the configured caps exactly; the semaphore's FIFO queue keeps
//! claims from starving each other.
//!
//! The manager is an explicit value constructed at run entry and passed to
//! the orchestrator; there is no global instance.

use std::sync::Arc;

use adm_domain::AdmError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A counting semaphore with an observable in-use count.
#[derive(Debug)]
pub struct Sema {
    permits: Arc<Semaphore>,
    capacity: usize,
}

/// An acquired permit (or batch of permits); released on drop.
#[derive(Debug)]
pub struct SemaPermit {
    _permit: OwnedSemaphorePermit,
}

impl Sema {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently available. Approximate under concurrency; used
    /// only for scheduling heuristics and observability.
    pub fn free(&self) -> usize {
        self.permits.available_permits()
    }

    /// Permits currently held. Approximate, as `free`.
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.permits.available_permits())
    }

    /// Waits for one permit.
    pub async fn acquire(&self) -> Result<SemaPermit, AdmError> {
        self.acquire_many(1).await
    }

    /// Waits for `n` permits granted atomically; a waiter holds nothing
    /// until the full batch is available.
    pub async fn acquire_many(&self, n: u32) -> Result<SemaPermit, AdmError> {
        let permit = self
            .permits
            .clone()
            .acquire_many_owned(n)
            .await
            .map_err(|_| AdmError::internal("semaphore closed"))?;
        Ok(SemaPermit { _permit: permit })
    }
}

/// Permits for one I/O-bearing task: 1 worker + 1 open-IO.
#[derive(Debug)]
pub struct TaskPermit {
    _worker: SemaPermit,
    _io: SemaPermit,
}

/// Permits for one reader/writer channel pair: 2 workers + 2 open-IO.
#[derive(Debug)]
pub struct ChannelPairPermit {
    _workers: SemaPermit,
    _io: SemaPermit,
}

/// The run's shared resource caps.
#[derive(Debug)]
pub struct ResourceManager {
    workers: Sema,
    open_io: Sema,
}

impl ResourceManager {
    /// Capacities come from configuration (`worker_size`, `open_io`);
    /// configuration validates both are at least 2 so a channel pair can
    /// always be scheduled.
    pub fn new(worker_size: usize, open_io: usize) -> Self {
        Self {
            workers: Sema::new(worker_size),
            open_io: Sema::new(open_io),
        }
    }

    pub fn workers(&self) -> &Sema {
        &self.workers
    }

    pub fn open_io(&self) -> &Sema {
        &self.open_io
    }

    /// Claims permits for a single I/O-bearing task.
    pub async fn acquire_task(&self) -> Result<TaskPermit, AdmError> {
        let worker = self.workers.acquire().await?;
        let io = self.open_io.acquire().await?;
        Ok(TaskPermit {
            _worker: worker,
            _io: io,
        })
    }

    /// Claims permits for a reader/writer pair in one atomic step per
    /// semaphore, workers first.
    pub async fn acquire_channel_pair(&self) -> Result<ChannelPairPermit, AdmError> {
        let workers = self.workers.acquire_many(2).await?;
        let io = self.open_io.acquire_many(2).await?;
        Ok(ChannelPairPermit {
            _workers: workers,
            _io: io,
        })
    }

    /// The smaller of the two free counts; the window sub-phase sizes its
    /// fetch ranges from it.
    pub fn min_free(&self) -> usize {
        self.workers.free().min(self.open_io.free())
    }
}
