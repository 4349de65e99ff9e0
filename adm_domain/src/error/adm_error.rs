// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! [`AdmError`] is the single error type threaded through every layer of the
//! migrator. Each variant names a fatal failure cause: the operation that
//! returned it could not make progress and the owning phase must abort.
//!
//! Partial failures are deliberately *not* errors. An operation that
//! processed most of its keys and lost a few reports those keys through its
//! return value (see [`FailedKey`](super::FailedKey) and the report structs
//! in [`repositories`](crate::repositories)); the pipeline would rather
//! quarantine some keys than kill a whole phase.
//!
//! ## Error Categories
//!
//! - **InvalidConfiguration**: malformed or missing configuration, or a
//!   requested adapter mode that cannot be constructed.
//! - **Transport**: the HTTP query transport exhausted its retries.
//! - **Decode**: a response failed structural validation. Never retried.
//! - **Journal**: the durable progress store failed an operation.
//! - **IoError**: file system failures on the sink side.
//! - **Internal**: invariant violations and task failures (panics, joins).

use thiserror::Error;

/// Fatal failure causes for the archival data migrator.
///
/// Variants carry a human-readable message; `category()` gives a stable
/// short tag for logging and metrics-style aggregation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("journal error: {0}")]
    Journal(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AdmError {
    /// Creates a new configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a new journal error
    pub fn journal(msg: impl Into<String>) -> Self {
        Self::Journal(msg.into())
    }

    /// Creates a new IO error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Checks if the error indicates a retry-able condition for a later run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AdmError::Transport(_) | AdmError::IoError(_))
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            AdmError::InvalidConfiguration(_) => "configuration",
            AdmError::Transport(_) => "transport",
            AdmError::Decode(_) => "decode",
            AdmError::Journal(_) => "journal",
            AdmError::IoError(_) => "io",
            AdmError::Internal(_) => "internal",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for AdmError {
    fn from(err: std::io::Error) -> Self {
        AdmError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AdmError {
    fn from(err: serde_json::Error) -> Self {
        AdmError::Decode(err.to_string())
    }
}
