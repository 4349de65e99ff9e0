// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Density Window
//!
//! A [`Window`] is the coarse sample histogram of one stream: an ordered
//! sequence of `(start_time_ns, count)` readings where each count covers
//! `[start_i, start_{i+1})` and the last reading runs until "now". The
//! source buckets readings on a fixed wall-clock span (one year in the
//! reference deployment), so a window is small even for decade-long
//! streams.
//!
//! Windows exist to bound work: instead of one unbounded range query per
//! stream, the planner turns each window into [`TimeSlot`]s whose counts
//! are known up front, then packs slots from many streams into chunks of
//! comparable size.
//!
//! A stream with no samples has an empty window (or all-zero counts);
//! such streams produce no fetchable slots.

use serde::{Deserialize, Serialize};

use super::time_slot::{TimeSlot, END_TIME_NOW};

/// One histogram bucket: samples counted from `start_time_ns` until the
/// next reading's start (or "now" for the last reading).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub start_time_ns: i64,
    pub count: i64,
}

impl Reading {
    pub fn new(start_time_ns: i64, count: i64) -> Self {
        Self {
            start_time_ns,
            count,
        }
    }
}

/// The per-stream sample histogram used to plan time-series work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    uuid: String,
    readings: Vec<Reading>,
}

impl Window {
    pub fn new(uuid: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            uuid: uuid.into(),
            readings,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn total_count(&self) -> i64 {
        self.readings.iter().map(|r| r.count).sum()
    }

    /// Derives the ordered slot list: slot `i` spans from reading `i`'s
    /// start to reading `i+1`'s start, and the last slot is open-ended.
    pub fn time_slots(&self) -> Vec<TimeSlot> {
        self.readings
            .iter()
            .enumerate()
            .map(|(i, reading)| {
                let end_time_ns = match self.readings.get(i + 1) {
                    Some(next) => next.start_time_ns,
                    None => END_TIME_NOW,
                };
                TimeSlot::new(
                    self.uuid.clone(),
                    reading.start_time_ns,
                    end_time_ns,
                    reading.count,
                )
            })
            .collect()
    }
}
