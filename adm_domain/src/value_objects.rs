// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Value objects of the migration domain.

pub mod chunk;
pub mod data_tuple;
pub mod journal_status;
pub mod time_slot;
pub mod window;

pub use chunk::Chunk;
pub use data_tuple::{MetadataTuple, TimeseriesTuple};
pub use journal_status::{JournalStatus, RunState};
pub use time_slot::{TimeSlot, END_TIME_NOW};
pub use window::{Reading, Window};
