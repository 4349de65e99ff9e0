// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Planner
//!
//! [`ChunkPacker`] groups time slots into chunks by cumulative sample
//! count. The caller feeds slots in planning order (window order, then
//! slot order within each window); the packer emits a chunk whenever the
//! running count reaches the configured threshold.
//!
//! ## Boundary rule
//!
//! The slot that pushes the running count across the threshold ships with
//! the chunk being emitted, and its count also seeds the running count of
//! the next chunk. Given slots with counts `[6, 4, 3]` and a threshold of
//! 10, the first chunk is `[6, 4]` and the running count restarts at 4.
//! Chunk boundaries are therefore deterministic in the input order alone,
//! which keeps re-planned runs bit-identical.
//!
//! ## End of stream
//!
//! [`ChunkPacker::finish`] appends a synthetic final slot (uuid
//! [`FINAL_SLOT_UUID`], count equal to the threshold) so a trailing
//! partial chunk is always flushed. The sentinel itself never appears in
//! an emitted chunk, is never fetched, and is never journaled.
//!
//! Skipping rules (already-complete slots, zero-count slots) are the
//! orchestrator's responsibility; the packer is a pure fold over whatever
//! it is fed.

use crate::value_objects::{Chunk, TimeSlot, END_TIME_NOW};

/// Stream identifier of the synthetic end-of-stream slot.
pub const FINAL_SLOT_UUID: &str = "final";

/// Packs slots into chunks by cumulative count.
#[derive(Debug)]
pub struct ChunkPacker {
    chunk_size: i64,
    current: i64,
    pending: Vec<TimeSlot>,
}

impl ChunkPacker {
    /// Creates a packer with the given emission threshold. The threshold
    /// must be positive; configuration validates it before planning.
    pub fn new(chunk_size: i64) -> Self {
        Self {
            chunk_size,
            current: 0,
            pending: Vec::new(),
        }
    }

    /// Adds a slot to the pending chunk, emitting the chunk if the running
    /// count reached the threshold. The triggering slot is included in the
    /// emitted chunk and its count seeds the next one.
    pub fn push(&mut self, slot: TimeSlot) -> Option<Chunk> {
        let seed = slot.count();
        self.current += seed;
        self.pending.push(slot);

        if self.current >= self.chunk_size {
            self.current = seed;
            return Some(Chunk::new(std::mem::take(&mut self.pending)));
        }
        None
    }

    /// Flushes the trailing partial chunk, if any, by pushing the
    /// synthetic final slot and stripping it from the emission.
    pub fn finish(mut self) -> Option<Chunk> {
        let sentinel = TimeSlot::new(FINAL_SLOT_UUID, 0, END_TIME_NOW, self.chunk_size);
        if let Some(chunk) = self.push(sentinel) {
            let mut slots = chunk.into_slots();
            slots.retain(|slot| slot.uuid() != FINAL_SLOT_UUID);
            if !slots.is_empty() {
                return Some(Chunk::new(slots));
            }
        }
        None
    }
}
