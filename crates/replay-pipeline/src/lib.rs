// SPDX-License-Identifier: Apache-2.0

//! Replay pipeline for modem/baseband diagnostic log files.
//!
//! A replay run reads one diagnostic file, decodes its lines into typed
//! records per the active scenario, pairs uplink grant and data records
//! across the wrapping MAC time counter, aggregates a per-entity
//! degraded/ok map, and pushes the serialized records as label-addressed
//! streams to a Loki-compatible backend, rate limited and with capped
//! retry. See [`replay::replay_file`] for the orchestration entry point.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batcher;
pub mod config;
pub mod correlate;
pub mod decoder;
pub mod error;
pub mod flusher;
pub mod malperformance;
pub mod metrics;
pub mod ordered_map;
pub mod persistence;
pub mod record;
pub mod replay;

pub use config::Config;
pub use decoder::Scenario;
pub use error::{PushError, ReplayError};
pub use metrics::ReplayMetrics;
pub use persistence::{MemoryMetadataStore, MetadataStore, NullMetadataStore};
pub use record::{LogRecord, SecondaryTag, Tag};
pub use replay::{replay_file, spawn_replay, ReplaySummary, RunParams};
