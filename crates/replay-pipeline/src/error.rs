// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use thiserror::Error;

/// Terminal delivery failures surfaced by the push client after its retry
/// budget is spent.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("failed to construct push client")]
    Client(#[source] reqwest::Error),
    #[error("push endpoint kept rate limiting after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },
    #[error("push endpoint returned {status} after {attempts} attempts")]
    Status {
        status: reqwest::StatusCode,
        attempts: u32,
    },
    #[error("push request failed after {attempts} attempts")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
}

/// Failures that abort a replay run.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Push(#[from] PushError),
}
