// SPDX-License-Identifier: Apache-2.0

//! Rate-limited delivery of batches to the log-ingestion endpoint.
//!
//! The client enforces a minimum inter-request spacing derived from a
//! requests-per-second ceiling, then posts each batch as one stream. A 429
//! response or a transport failure is retried with exponential backoff up to
//! a fixed ceiling; spending the whole retry budget is terminal for the
//! replay run.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::batcher::{Batch, StreamLabels};
use crate::error::PushError;

const PUSH_PATH: &str = "/loki/api/v1/push";

/// Minimum-spacing throttle. Owned by one replay run; concurrent runs each
/// carry their own limiter so they cannot starve each other.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Option<Duration>,
    last_push: Option<Instant>,
}

impl RateLimiter {
    /// A ceiling of zero or less disables throttling.
    #[must_use]
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second > 0.0 {
            Some(Duration::from_secs_f64(1.0 / requests_per_second))
        } else {
            None
        };
        RateLimiter {
            min_interval,
            last_push: None,
        }
    }

    /// Suspends until the minimum interval since the previous push has
    /// elapsed, then records the new last-push time.
    pub async fn wait_if_needed(&mut self) {
        let Some(interval) = self.min_interval else {
            return;
        };
        let now = Instant::now();
        if let Some(last) = self.last_push {
            let elapsed = now.duration_since(last);
            if elapsed < interval {
                sleep(interval - elapsed).await;
                self.last_push = Some(Instant::now());
                return;
            }
        }
        self.last_push = Some(now);
    }
}

#[derive(Debug, Clone)]
pub struct PushClientConfig {
    pub base_url: String,
    /// Optional tenant forwarded as `X-Scope-OrgID`.
    pub tenant: Option<String>,
    pub timeout: Duration,
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub requests_per_second: f64,
    /// First backoff step; doubles on each retry.
    pub backoff_base: Duration,
}

impl Default for PushClientConfig {
    fn default() -> Self {
        PushClientConfig {
            base_url: "http://127.0.0.1:3100".to_string(),
            tenant: None,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            requests_per_second: 10.0,
            backoff_base: Duration::from_secs(1),
        }
    }
}

#[derive(Serialize)]
struct PushRequest<'a> {
    streams: [PushStream<'a>; 1],
}

#[derive(Serialize)]
struct PushStream<'a> {
    stream: &'a StreamLabels,
    values: Vec<[&'a str; 2]>,
}

/// HTTP client for the push endpoint, owned by one replay run.
pub struct PushClient {
    http: reqwest::Client,
    push_url: String,
    tenant: Option<String>,
    max_retries: u32,
    backoff_base: Duration,
    limiter: RateLimiter,
}

impl PushClient {
    pub fn new(config: PushClientConfig) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PushError::Client)?;
        Ok(PushClient {
            http,
            push_url: format!("{}{PUSH_PATH}", config.base_url.trim_end_matches('/')),
            tenant: config.tenant,
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
            limiter: RateLimiter::new(config.requests_per_second),
        })
    }

    pub async fn push_batch(&mut self, batch: &Batch) -> Result<(), PushError> {
        self.push(&batch.labels, &batch.values).await
    }

    /// Delivers one stream of `(timestamp, line)` pairs under the given
    /// label set, throttling and retrying as configured.
    pub async fn push(
        &mut self,
        labels: &StreamLabels,
        values: &[(String, String)],
    ) -> Result<(), PushError> {
        self.limiter.wait_if_needed().await;
        let body = PushRequest {
            streams: [PushStream {
                stream: labels,
                values: values
                    .iter()
                    .map(|(ts, line)| [ts.as_str(), line.as_str()])
                    .collect(),
            }],
        };

        let mut attempt: u32 = 0;
        loop {
            let mut request = self.http.post(&self.push_url).json(&body);
            if let Some(tenant) = &self.tenant {
                request = request.header("X-Scope-OrgID", tenant);
            }
            let outcome = request.send().await;
            let attempts = attempt + 1;
            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!(%status, entries = values.len(), "batch pushed");
                        return Ok(());
                    }
                    if attempt >= self.max_retries {
                        return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                            PushError::RateLimitExceeded { attempts }
                        } else {
                            PushError::Status { status, attempts }
                        });
                    }
                    warn!(%status, attempt = attempts, "push rejected, backing off");
                }
                Err(source) => {
                    if attempt >= self.max_retries {
                        return Err(PushError::Transport { attempts, source });
                    }
                    warn!(error = %source, attempt = attempts, "push failed, backing off");
                }
            }
            sleep(self.backoff(attempt)).await;
            attempt += 1;
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * (1u32 << attempt.min(16))
    }
}
