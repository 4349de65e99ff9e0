// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Ports implemented by infrastructure adapters: the source the migrator
//! reads from, the sink it writes to, and the durable progress journal.

pub mod progress_journal;
pub mod sink_writer;
pub mod source_reader;

pub use progress_journal::ProgressJournal;
pub use sink_writer::{MetadataWrite, SinkWriter, TimeseriesWrite};
pub use source_reader::{ReadReport, SourceReader, WindowsRead};
