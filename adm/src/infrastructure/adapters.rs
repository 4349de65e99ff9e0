// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Source and sink adapters behind the domain ports.

pub mod file_reader;
pub mod file_writer;
pub mod giles_reader;
pub mod query_transport;

pub use file_reader::FileReader;
pub use file_writer::FileWriter;
pub use giles_reader::GilesReader;
pub use query_transport::{HttpQueryTransport, QueryExec};
