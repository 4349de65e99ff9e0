// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Infrastructure layer: adapters behind the domain ports, configuration,
//! the progress journal, and runtime resource governance.

pub mod adapters;
pub mod config;
pub mod repositories;
pub mod runtime;
