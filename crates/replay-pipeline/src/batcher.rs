// SPDX-License-Identifier: Apache-2.0

//! Per-label batching of serialized records.
//!
//! Each record is appended under its stream label set; a batch whose value
//! list reaches the configured size is handed back to the caller for
//! delivery, and everything left over is drained at stream end. Batches are
//! kept and drained in first-seen label order.

use std::fmt::Display;

use serde::Serialize;

use crate::ordered_map::OrderedMap;
use crate::record::LogRecord;

/// Sanitizes a value for use as a stream label: absent values become
/// `"unknown"`, double quotes are escaped, newlines collapse to spaces.
#[must_use]
pub fn label_value<T: Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string().replace('"', "\\\"").replace('\n', " "),
        None => "unknown".to_string(),
    }
}

/// Identity of one output stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StreamLabels {
    pub run_id: String,
    pub user: String,
    pub filename: String,
    pub tag: String,
    pub sector_id: String,
}

impl StreamLabels {
    #[must_use]
    pub fn for_record(
        run_id: Option<&str>,
        user: &str,
        filename: &str,
        record: &LogRecord,
    ) -> Self {
        StreamLabels {
            run_id: label_value(run_id),
            user: label_value(Some(user)),
            filename: label_value(Some(filename)),
            tag: label_value(Some(record.tag.label())),
            sector_id: label_value(record.sector_id),
        }
    }
}

/// A full or final batch ready for delivery: ordered
/// `(delivery_timestamp, serialized_record)` pairs under one label set.
#[derive(Debug, Clone)]
pub struct Batch {
    pub labels: StreamLabels,
    pub values: Vec<(String, String)>,
}

/// Accumulates records per label set and emits size-triggered batches.
pub struct LabelBatcher {
    batch_size: usize,
    batches: OrderedMap<StreamLabels, Vec<(String, String)>>,
}

impl LabelBatcher {
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        LabelBatcher {
            batch_size: batch_size.max(1),
            batches: OrderedMap::new(),
        }
    }

    /// Appends one serialized record. Returns the batch for `labels` when
    /// the append fills it to the configured size; the label set itself
    /// stays registered so later appends reuse its stream position.
    pub fn append(
        &mut self,
        labels: StreamLabels,
        timestamp: String,
        line: String,
    ) -> Option<Batch> {
        if !self.batches.contains_key(&labels) {
            self.batches.insert(labels.clone(), Vec::new());
        }
        let values = self.batches.get_mut(&labels)?;
        values.push((timestamp, line));
        if values.len() >= self.batch_size {
            let full = std::mem::take(values);
            Some(Batch {
                labels,
                values: full,
            })
        } else {
            None
        }
    }

    /// Takes every non-empty batch, in first-seen label order. Called at
    /// stream end.
    pub fn drain(&mut self) -> Vec<Batch> {
        self.batches
            .drain()
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(labels, values)| Batch { labels, values })
            .collect()
    }

    /// Records currently buffered across all labels.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.batches.iter().map(|(_, values)| values.len()).sum()
    }
}
