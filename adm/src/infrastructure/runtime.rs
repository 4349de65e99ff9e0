// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Runtime concerns: resource governance and supervised task spawning.

pub mod resource_manager;
pub mod supervisor;

pub use resource_manager::{ResourceManager, Sema};
pub use supervisor::{join_supervised, spawn_supervised, AdmResult};
