// SPDX-License-Identifier: Apache-2.0

//! Replay orchestration: one run reads a diagnostic file line by line,
//! decodes, correlates, aggregates, batches, and pushes, strictly in file
//! order on a single worker. Runs are independent; the orchestrator starts
//! them fire-and-forget via [`spawn_replay`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

use crate::batcher::{LabelBatcher, StreamLabels};
use crate::config::Config;
use crate::correlate::CorrelationEngine;
use crate::decoder::{Scenario, ScenarioDecoder};
use crate::error::{PushError, ReplayError};
use crate::flusher::{PushClient, PushClientConfig};
use crate::malperformance::{observe, MalperformanceMap};
use crate::metrics::ReplayMetrics;
use crate::persistence::MetadataStore;
use crate::record::{LogRecord, Tag};

/// Spacing between consecutive synthetic delivery timestamps.
pub const TIMESTAMP_STEP_NS: i64 = 100_000;

/// Default run start: this far behind the current wall clock, so replayed
/// streams land in the backend's recent-past window.
const START_OFFSET_NS: i64 = 1_200 * 1_000_000_000;

#[derive(Debug, Clone)]
pub struct RunParams {
    pub username: String,
    pub filename: String,
    pub file_path: PathBuf,
    pub scenario: Scenario,
    /// Carried as a stream label only.
    pub run_id: Option<String>,
    /// Base of the synthetic timestamp sequence; defaults to the current
    /// wall clock minus a fixed offset.
    pub start_ns: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub lines_read: u64,
    pub records_decoded: u64,
    pub records_matched: u64,
    pub stubs_emitted: u64,
    pub lines_sent: u64,
    pub batches_pushed: u64,
}

fn default_start_ns() -> i64 {
    let now_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);
    now_ns - START_OFFSET_NS
}

async fn deliver(
    batcher: &mut LabelBatcher,
    client: &mut PushClient,
    labels: StreamLabels,
    timestamp: &str,
    record: &LogRecord,
    summary: &mut ReplaySummary,
) -> Result<(), PushError> {
    if let Some(batch) = batcher.append(labels, timestamp.to_string(), record.to_json()) {
        summary.lines_sent += batch.values.len() as u64;
        summary.batches_pushed += 1;
        client.push_batch(&batch).await?;
    }
    Ok(())
}

/// Replays one file to completion. Terminal push failures abort the run;
/// a persistence failure at the end is logged but does not.
pub async fn replay_file(
    params: RunParams,
    config: &Config,
    metrics: Arc<ReplayMetrics>,
    store: Arc<dyn MetadataStore>,
) -> Result<ReplaySummary, ReplayError> {
    let start_ns = params.start_ns.unwrap_or_else(default_start_ns);
    let run_id = params.run_id.as_deref();

    let mut decoder = ScenarioDecoder::new(
        params.scenario,
        params.username.clone(),
        params.filename.clone(),
        metrics,
    );
    let mut engine = CorrelationEngine::new();
    let mut malperformance = MalperformanceMap::new();
    let mut batcher = LabelBatcher::new(config.batch_size);
    let mut client = PushClient::new(PushClientConfig {
        base_url: config.loki_url.clone(),
        tenant: config.tenant.clone(),
        timeout: config.push_timeout,
        max_retries: config.max_push_retries,
        requests_per_second: config.requests_per_second,
        ..PushClientConfig::default()
    })?;
    let mut summary = ReplaySummary::default();

    let file = File::open(&params.file_path)
        .await
        .map_err(|source| ReplayError::Io {
            path: params.file_path.clone(),
            source,
        })?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    info!(
        user = %params.username,
        file = %params.filename,
        scenario = %params.scenario,
        "replay started"
    );

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).await.map_err(|source| {
            ReplayError::Io {
                path: params.file_path.clone(),
                source,
            }
        })?;
        if read == 0 {
            break;
        }
        summary.lines_read += 1;
        // Undecodable bytes are replaced, never fatal.
        let raw = String::from_utf8_lossy(&buf);
        let line = raw.trim_end_matches(['\n', '\r']);

        let Some(mut record) = decoder.decode(line) else {
            continue;
        };
        summary.records_decoded += 1;

        let mut stubs = Vec::new();
        match record.tag {
            Tag::PbBasic => {
                engine.insert_grant(record.clone());
                stubs = engine.sweep(record.mac_time);
            }
            Tag::DppBasic => {
                stubs = engine.sweep(record.mac_time);
                if engine.try_match(&mut record) {
                    summary.records_matched += 1;
                }
            }
            _ => {}
        }

        observe(&mut malperformance, &record);

        let timestamp = (start_ns + decoder.counters().total() * TIMESTAMP_STEP_NS).to_string();
        for stub in &stubs {
            summary.stubs_emitted += 1;
            let labels =
                StreamLabels::for_record(run_id, &params.username, &params.filename, stub);
            deliver(&mut batcher, &mut client, labels, &timestamp, stub, &mut summary).await?;
        }
        let labels =
            StreamLabels::for_record(run_id, &params.username, &params.filename, &record);
        deliver(
            &mut batcher,
            &mut client,
            labels,
            &timestamp,
            &record,
            &mut summary,
        )
        .await?;

        if !config.replay_delay.is_zero() {
            sleep(config.replay_delay).await;
        }
    }

    for batch in batcher.drain() {
        summary.lines_sent += batch.values.len() as u64;
        summary.batches_pushed += 1;
        client.push_batch(&batch).await?;
    }

    if let Err(err) = store
        .save_malperformance(&params.username, &params.filename, &malperformance)
        .await
    {
        error!(
            user = %params.username,
            file = %params.filename,
            error = %err,
            "failed to persist malperformance map"
        );
    }

    info!(
        user = %params.username,
        file = %params.filename,
        lines_read = summary.lines_read,
        records = summary.records_decoded,
        matched = summary.records_matched,
        stubs = summary.stubs_emitted,
        sent = summary.lines_sent,
        "replay finished"
    );
    Ok(summary)
}

/// Starts a replay run fire-and-forget. The handle is returned for callers
/// that want to await completion (tests); the orchestrator drops it.
pub fn spawn_replay(
    params: RunParams,
    config: Config,
    metrics: Arc<ReplayMetrics>,
    store: Arc<dyn MetadataStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let username = params.username.clone();
        let filename = params.filename.clone();
        if let Err(err) = replay_file(params, &config, metrics, store).await {
            error!(user = %username, file = %filename, error = %err, "replay aborted");
        }
    })
}
