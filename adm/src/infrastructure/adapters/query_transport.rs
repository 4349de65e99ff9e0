// /////////////////////////////////////////////////////////////////////////////
// Archival Data Migrator (ADM)
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Retrying Query Transport
//!
//! Every query against the remote service goes through [`QueryExec`].
//! The production implementation posts the query text over HTTP and
//! retries transport failures with an escalating per-attempt timeout:
//! attempt `i` (zero-based) gets `base_timeout * (i + 1)` and a short
//! sleep precedes every retry. Decode problems are the caller's concern
//! and are never retried here.
//!
//! On exhaustion the last underlying error is returned, tagged
//! [`AdmError::Transport`].

use std::time::Duration;

use adm_domain::AdmError;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Maximum attempts per query.
pub const QUERY_TRIES: u32 = 3;
/// First-attempt timeout; later attempts escalate linearly.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// Pause between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Executes one query string against the source, returning raw bytes.
#[async_trait]
pub trait QueryExec: Send + Sync {
    async fn query(&self, body: &str) -> Result<Vec<u8>, AdmError>;
}

/// HTTP POST transport with retry and escalating timeouts.
#[derive(Debug)]
pub struct HttpQueryTransport {
    client: reqwest::Client,
    url: String,
    tries: u32,
    base_timeout: Duration,
    retry_delay: Duration,
}

impl HttpQueryTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_policy(url, QUERY_TRIES, QUERY_TIMEOUT, RETRY_DELAY)
    }

    /// Full control over the retry policy; tests shrink the delays.
    pub fn with_policy(
        url: impl Into<String>,
        tries: u32,
        base_timeout: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            tries: tries.max(1),
            base_timeout,
            retry_delay,
        }
    }

    async fn attempt(&self, body: &str, timeout: Duration) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .post(&self.url)
            .body(body.to_string())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let response = response
            .error_for_status()
            .map_err(|e| format!("server error: {e}"))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl QueryExec for HttpQueryTransport {
    async fn query(&self, body: &str) -> Result<Vec<u8>, AdmError> {
        let mut last_error = String::from("no attempts made");

        for attempt in 0..self.tries {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay).await;
            }
            let timeout = self.base_timeout * (attempt + 1);
            debug!(attempt = attempt + 1, ?timeout, "issuing query");

            match self.attempt(body, timeout).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "query attempt failed");
                    last_error = e;
                }
            }
        }

        Err(AdmError::transport(format!(
            "query to {} exhausted {} attempts: {last_error}",
            self.url, self.tries
        )))
    }
}
