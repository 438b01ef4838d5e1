// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, path::PathBuf, process, sync::Arc};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use replay_pipeline::{replay_file, Config, NullMetadataStore, ReplayMetrics, RunParams, Scenario};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("REPLAY_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());
    let env_filter = format!("hyper=off,reqwest=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut args = env::args().skip(1);
    let (scenario, path) = match (args.next(), args.next()) {
        (Some(scenario), Some(path)) => (scenario, path),
        _ => {
            error!("usage: replay-runner <scenario> <log-file> [username]");
            process::exit(2);
        }
    };
    let username = args.next().unwrap_or_else(|| "local".to_string());

    let file_path = PathBuf::from(&path);
    let filename = file_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.clone());

    let params = RunParams {
        username,
        filename,
        file_path,
        scenario: Scenario::from_name(&scenario),
        run_id: Some(format!("run-{}", process::id())),
        start_ns: None,
    };
    let config = Config::from_env();
    let metrics = Arc::new(ReplayMetrics::new());
    let store = Arc::new(NullMetadataStore);

    match replay_file(params, &config, metrics, store).await {
        Ok(summary) => {
            info!(
                lines_read = summary.lines_read,
                records = summary.records_decoded,
                matched = summary.records_matched,
                stubs = summary.stubs_emitted,
                sent = summary.lines_sent,
                batches = summary.batches_pushed,
                "replay complete"
            );
        }
        Err(err) => {
            error!(error = %err, "replay failed");
            process::exit(1);
        }
    }
}
