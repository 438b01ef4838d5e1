// SPDX-License-Identifier: Apache-2.0

//! Run-spanning pipeline counters.
//!
//! Counters are keyed by name plus the `(user, filename)` pair and, for
//! per-tag counters, a sector label. Increments are fire-and-forget: the
//! pipeline never observes a metrics failure, including a poisoned lock
//! after a panicking sibling run.

use std::sync::Mutex;

use fnv::FnvHashMap;

/// Total lines fed to a decoder, recognized or not.
pub const LINES_PROCESSED: &str = "dpp_logs_processed_total";
/// Data/grant records whose CRC indicator reported a failure.
pub const CRC_FAILS: &str = "total_crc_fails";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CounterKey {
    name: &'static str,
    user: String,
    filename: String,
    sector: Option<String>,
}

/// Concurrent counter registry shared by all replay runs in the process.
#[derive(Debug, Default)]
pub struct ReplayMetrics {
    counters: Mutex<FnvHashMap<CounterKey, u64>>,
}

impl ReplayMetrics {
    #[must_use]
    pub fn new() -> Self {
        ReplayMetrics {
            counters: Mutex::new(FnvHashMap::default()),
        }
    }

    fn incr(&self, key: CounterKey) {
        if let Ok(mut counters) = self.counters.lock() {
            *counters.entry(key).or_insert(0) += 1;
        }
    }

    pub fn incr_lines(&self, user: &str, filename: &str) {
        self.incr(CounterKey {
            name: LINES_PROCESSED,
            user: user.to_string(),
            filename: filename.to_string(),
            sector: None,
        });
    }

    pub fn incr_tag(&self, counter: &'static str, user: &str, filename: &str, sector: &str) {
        self.incr(CounterKey {
            name: counter,
            user: user.to_string(),
            filename: filename.to_string(),
            sector: Some(sector.to_string()),
        });
    }

    pub fn incr_crc_fail(&self, user: &str, filename: &str, sector: &str) {
        self.incr(CounterKey {
            name: CRC_FAILS,
            user: user.to_string(),
            filename: filename.to_string(),
            sector: Some(sector.to_string()),
        });
    }

    /// Current value of one counter; zero when never incremented.
    #[must_use]
    pub fn value(
        &self,
        name: &'static str,
        user: &str,
        filename: &str,
        sector: Option<&str>,
    ) -> u64 {
        let key = CounterKey {
            name,
            user: user.to_string(),
            filename: filename.to_string(),
            sector: sector.map(str::to_string),
        };
        self.counters
            .lock()
            .map(|counters| counters.get(&key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}
