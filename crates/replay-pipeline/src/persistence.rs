// SPDX-License-Identifier: Apache-2.0

//! Persistence seam for the end-of-run malperformance map.
//!
//! The pipeline hands the finished map to a [`MetadataStore`] once per run;
//! what the store does with it (relational persistence, dashboards) lives
//! outside this crate.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::malperformance::{MalperfKey, MalperformanceMap};

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn save_malperformance(
        &self,
        username: &str,
        filename: &str,
        map: &MalperformanceMap,
    ) -> anyhow::Result<()>;
}

/// Store that discards everything, for runs without a persistence backend.
#[derive(Debug, Default)]
pub struct NullMetadataStore;

#[async_trait]
impl MetadataStore for NullMetadataStore {
    async fn save_malperformance(
        &self,
        _username: &str,
        _filename: &str,
        _map: &MalperformanceMap,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One persisted run snapshot.
#[derive(Debug, Clone)]
pub struct SavedRun {
    pub username: String,
    pub filename: String,
    pub entries: Vec<(MalperfKey, bool)>,
}

/// In-memory store used by tests to observe what a run persisted.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    runs: Mutex<Vec<SavedRun>>,
}

impl MemoryMetadataStore {
    #[must_use]
    pub fn new() -> Self {
        MemoryMetadataStore::default()
    }

    #[must_use]
    pub fn runs(&self) -> Vec<SavedRun> {
        self.runs
            .lock()
            .map(|runs| runs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn save_malperformance(
        &self,
        username: &str,
        filename: &str,
        map: &MalperformanceMap,
    ) -> anyhow::Result<()> {
        let entries = map.iter().map(|(k, v)| (k.clone(), v)).collect();
        if let Ok(mut runs) = self.runs.lock() {
            runs.push(SavedRun {
                username: username.to_string(),
                filename: filename.to_string(),
                entries,
            });
        }
        Ok(())
    }
}
