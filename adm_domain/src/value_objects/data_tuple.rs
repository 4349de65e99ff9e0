// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! In-flight carriers on the reader-to-writer channels. A tuple binds the
//! raw payload bytes to the keys that produced them, so the writer can
//! report exactly which keys were persisted and which failed. Each tuple
//! is consumed exactly once by the writer.

use super::time_slot::TimeSlot;

/// A metadata payload and the batch of stream identifiers it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTuple {
    uuids: Vec<String>,
    data: Vec<u8>,
}

impl MetadataTuple {
    pub fn new(uuids: Vec<String>, data: Vec<u8>) -> Self {
        Self { uuids, data }
    }

    pub fn uuids(&self) -> &[String] {
        &self.uuids
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<u8>) {
        (self.uuids, self.data)
    }
}

/// A time-series payload for a single slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeseriesTuple {
    slot: TimeSlot,
    data: Vec<u8>,
}

impl TimeseriesTuple {
    pub fn new(slot: TimeSlot, data: Vec<u8>) -> Self {
        Self { slot, data }
    }

    pub fn slot(&self) -> &TimeSlot {
        &self.slot
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (TimeSlot, Vec<u8>) {
        (self.slot, self.data)
    }
}
