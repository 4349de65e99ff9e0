// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Time Slot
//!
//! A [`TimeSlot`] is one bounded time range `[start, end)` of one stream,
//! carrying the sample count the source's density window reported for that
//! range. Slots are derived from [`Window`](super::Window) readings, packed
//! into chunks by cumulative count, and journaled individually: the slot is
//! the unit of durable time-series progress.
//!
//! An `end_time_ns` of [`END_TIME_NOW`] (−1) marks the open upper bound
//! "until now"; only a window's last slot carries it.

use serde::{Deserialize, Serialize};

/// Sentinel upper bound meaning "now" (the range is open-ended).
pub const END_TIME_NOW: i64 = -1;

/// One time range of one stream; the unit of durable time-series progress.
///
/// Identity is the full tuple `(uuid, start, end, count)`: a re-windowed
/// stream produces different slot keys and is treated as new work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    uuid: String,
    start_time_ns: i64,
    end_time_ns: i64,
    count: i64,
}

impl TimeSlot {
    pub fn new(uuid: impl Into<String>, start_time_ns: i64, end_time_ns: i64, count: i64) -> Self {
        Self {
            uuid: uuid.into(),
            start_time_ns,
            end_time_ns,
            count,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn start_time_ns(&self) -> i64 {
        self.start_time_ns
    }

    pub fn end_time_ns(&self) -> i64 {
        self.end_time_ns
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// True when the slot's upper bound is "now".
    pub fn is_open_ended(&self) -> bool {
        self.end_time_ns == END_TIME_NOW
    }

    /// Stable journal key for this slot's status entry.
    pub fn journal_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.uuid, self.start_time_ns, self.end_time_ns, self.count
        )
    }
}
