// SPDX-License-Identifier: Apache-2.0

//! Per-entity degraded/ok aggregation over one replay run.
//!
//! Each decoded record yields a tag-specific verdict which is merged into a
//! run-scoped map keyed by `(tag, sector, entity)`. The merge is sticky-true:
//! once an entity is marked degraded it stays degraded for the rest of the
//! run, whatever later records say. Stubs never contribute a verdict. The
//! final map is handed to the persistence collaborator at stream end; this
//! module performs no I/O.

use hashbrown::HashMap;
use serde::Serialize;

use crate::record::{LogRecord, Tag};

/// State value marking a cell-state entity as terminally degraded.
const TERMINAL_STATE: i64 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MalperfKey {
    pub tag: &'static str,
    pub sector_id: Option<i64>,
    pub entity_id: Option<i64>,
}

/// Run-scoped sticky-true degradation map.
#[derive(Debug, Clone, Default)]
pub struct MalperformanceMap {
    entries: HashMap<MalperfKey, bool>,
}

impl MalperformanceMap {
    #[must_use]
    pub fn new() -> Self {
        MalperformanceMap {
            entries: HashMap::new(),
        }
    }

    /// Merges one verdict. `true` is permanent; `false` only creates or
    /// confirms a not-yet-degraded key.
    pub fn merge(&mut self, key: MalperfKey, degraded: bool) {
        let entry = self.entries.entry(key).or_insert(false);
        *entry = *entry || degraded;
    }

    #[must_use]
    pub fn get(&self, key: &MalperfKey) -> Option<bool> {
        self.entries.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MalperfKey, bool)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }
}

/// Tag-specific degradation verdict for one record. `None` means the record
/// does not participate (stubs).
#[must_use]
pub fn verdict(record: &LogRecord) -> Option<bool> {
    if record.is_stub {
        return None;
    }
    let degraded = match record.tag {
        // Data records fail on CRC error; grants and the mobility tags
        // only register the entity.
        Tag::DppBasic => record.field_i64("crc") == Some(1),
        Tag::UmrcDp => record.field_i64("crc") == Some(0),
        Tag::PbBasic | Tag::UracRa | Tag::UlcaPhrPwrAl => false,
        // State tags degrade on a backwards state transition or on
        // reaching the terminal state.
        Tag::ScellStateUlca | Tag::PcellState => {
            match (record.field_i64("prev_state"), record.field_i64("u_state")) {
                (Some(prev), Some(new)) => prev > new || new == TERMINAL_STATE,
                _ => false,
            }
        }
    };
    Some(degraded)
}

/// Applies one record's verdict to the map.
pub fn observe(map: &mut MalperformanceMap, record: &LogRecord) {
    if let Some(degraded) = verdict(record) {
        map.merge(
            MalperfKey {
                tag: record.tag.label(),
                sector_id: record.sector_id,
                entity_id: record.ue_id,
            },
            degraded,
        );
    }
}
