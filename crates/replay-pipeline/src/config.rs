// SPDX-License-Identifier: Apache-2.0

//! Pipeline configuration, overridable from the environment.

use std::env;
use std::time::Duration;

use tracing::warn;

const DEFAULT_LOKI_URL: &str = "http://127.0.0.1:3100";
const DEFAULT_BATCH_SIZE: usize = 1000;
const DEFAULT_REPLAY_DELAY: Duration = Duration::from_millis(1);
const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;
const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_PUSH_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ingestion backend.
    pub loki_url: String,
    /// Records per stream before a batch is flushed.
    pub batch_size: usize,
    /// Pause after each decoded line, throttling replay speed.
    pub replay_delay: Duration,
    /// Push-rate ceiling per run; zero disables throttling.
    pub requests_per_second: f64,
    /// Optional tenant forwarded to the backend.
    pub tenant: Option<String>,
    pub push_timeout: Duration,
    pub max_push_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            loki_url: DEFAULT_LOKI_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            replay_delay: DEFAULT_REPLAY_DELAY,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            tenant: None,
            push_timeout: DEFAULT_PUSH_TIMEOUT,
            max_push_retries: DEFAULT_MAX_PUSH_RETRIES,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(%name, %raw, "ignoring unparsable environment override");
            None
        }
    }
}

impl Config {
    /// Builds a config from defaults plus environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(url) = env::var("LOKI_PUSH_URL") {
            config.loki_url = url;
        }
        if let Some(size) = parse_env::<usize>("REPLAY_BATCH_SIZE") {
            config.batch_size = size.max(1);
        }
        if let Some(seconds) = parse_env::<f64>("REPLAY_DELAY") {
            if seconds >= 0.0 {
                config.replay_delay = Duration::from_secs_f64(seconds);
            }
        }
        if let Some(rps) = parse_env::<f64>("LOKI_REQUESTS_PER_SECOND") {
            config.requests_per_second = rps;
        }
        if let Ok(tenant) = env::var("LOKI_TENANT") {
            if !tenant.is_empty() {
                config.tenant = Some(tenant);
            }
        }
        config
    }
}
