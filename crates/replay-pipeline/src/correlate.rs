// SPDX-License-Identifier: Apache-2.0

//! Grant/data correlation across the wrapping MAC time counter.
//!
//! Every uplink grant (`PB_BASIC`) enters a pending set keyed by
//! `(ue, sector, process, mac_time)`. A data record (`DPP_BASIC`) claims the
//! grant issued a fixed number of ticks earlier; grants unclaimed after the
//! eviction window are turned into stub data records so the downstream
//! streams still account for every grant.
//!
//! All tick arithmetic is modular: the counter wraps at
//! [`MAC_TIME_WRAP`](crate::record::MAC_TIME_WRAP), so ages and offsets are
//! computed with wraparound, never plain subtraction.

use crate::ordered_map::OrderedMap;
use crate::record::{FieldValue, LogRecord, SecondaryTag, Tag, MAC_TIME_WRAP};

/// Scheduling delays, in ticks, between a grant and its data record.
/// Tried in order; the first hit wins.
pub const MATCH_OFFSETS: [i64; 2] = [6, 8];

/// A pending grant older than this many ticks can no longer be matched
/// and is evicted as a stub.
pub const PENDING_TIMEOUT_TICKS: i64 = 8;

type PendingKey = (Option<i64>, Option<i64>, Option<i64>, Option<i64>);

/// Age of `older` relative to `newer` on the wrapping tick counter.
#[must_use]
pub fn wrap_age(older: i64, newer: i64) -> i64 {
    if newer >= older {
        newer - older
    } else {
        MAC_TIME_WRAP - older + newer
    }
}

fn offset_key(record: &LogRecord, offset: i64) -> PendingKey {
    let mac = record.mac_time.map(|t| {
        if t >= offset {
            t - offset
        } else {
            MAC_TIME_WRAP - offset + t
        }
    });
    (record.ue_id, record.sector_id, record.process_id, mac)
}

/// Pending-grant set for one replay run.
#[derive(Default)]
pub struct CorrelationEngine {
    pending: OrderedMap<PendingKey, LogRecord>,
}

impl CorrelationEngine {
    #[must_use]
    pub fn new() -> Self {
        CorrelationEngine {
            pending: OrderedMap::new(),
        }
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Registers a grant. A later grant with an identical key replaces the
    /// earlier one, which then can never match or stub.
    pub fn insert_grant(&mut self, grant: LogRecord) {
        let key = (
            grant.ue_id,
            grant.sector_id,
            grant.process_id,
            grant.mac_time,
        );
        self.pending.insert(key, grant);
    }

    /// Evicts grants older than the timeout window relative to
    /// `current_time`, returning a stub data record per evicted grant in
    /// insertion order. Grants without a MAC time never age out.
    pub fn sweep(&mut self, current_time: Option<i64>) -> Vec<LogRecord> {
        let Some(current) = current_time else {
            return Vec::new();
        };
        let timed_out: Vec<PendingKey> = self
            .pending
            .iter()
            .filter(|(_, grant)| match grant.mac_time {
                Some(granted_at) => wrap_age(granted_at, current) > PENDING_TIMEOUT_TICKS,
                None => false,
            })
            .map(|(key, _)| *key)
            .collect();
        let mut stubs = Vec::with_capacity(timed_out.len());
        for key in timed_out {
            if let Some(grant) = self.pending.remove(&key) {
                stubs.push(make_stub(&grant));
            }
        }
        stubs
    }

    /// Pairs a data record with its grant, if one is pending at either
    /// match offset. On a hit the record is marked matched, its
    /// `pb_matching_index` is set to the grant's index, and the grant
    /// leaves the pending set.
    pub fn try_match(&mut self, data: &mut LogRecord) -> bool {
        for offset in MATCH_OFFSETS {
            let key = offset_key(data, offset);
            if self.pending.contains_key(&key) {
                if let Some(grant) = self.pending.remove(&key) {
                    data.pb_matching_index = Some(grant.index);
                    data.secondary_tag = Some(SecondaryTag::Matched);
                    return true;
                }
            }
        }
        false
    }

}

/// Builds the stub data record standing in for an expired grant. The stub
/// keeps the data-record schema: grant-derived fields are copied over, the
/// rest are zeroed. It carries the grant's entity key so downstream
/// aggregation can attribute the miss.
fn make_stub(grant: &LogRecord) -> LogRecord {
    let copied = |name: &str| match grant.field(name) {
        Some(v) => v,
        None => FieldValue::Missing,
    };
    let zero = FieldValue::Int(0);
    let fields = vec![
        ("macgps_time", zero),
        ("sector_id", FieldValue::from_opt(grant.sector_id)),
        ("ue_id", FieldValue::from_opt(grant.ue_id)),
        ("call_id", FieldValue::Int(-1)),
        ("crc", zero),
        ("retx_cnt", zero),
        ("process_id", FieldValue::from_opt(grant.process_id)),
        ("rnti", copied("u_rnti")),
        ("mcs_level", copied("u_mcs_level")),
        ("service_type", copied("u_service_type")),
        ("u_size", copied("u_size")),
        ("n_power_ratio", zero),
        ("cqiRequest*1000+ReportHeadroom", zero),
        ("SIR_before_SIC_0", zero),
        ("nInstDmrsSinrdB", zero),
        ("uPuschIndex*100000+uPuschOffsetAntNum*100+mimo_en", zero),
        ("rb_cnt", copied("u_rb_cnt")),
        ("pdecode_n_timeoffset", zero),
        ("n_time_offset_0", zero),
        ("n_time_offset_1", zero),
        ("snr_0+snr_1", zero),
        ("snr_2+snr_3", zero),
        ("a_air_time", zero),
        ("pdecode_packet", zero),
        ("bSpsEnable*1000+isUlCompnOn*10+bBundlingPDU", zero),
        ("push_dtx_threshold", zero),
        ("PreRlfStayCount+isPreRlfFlagOn", zero),
        (
            "uCompJRAntNumFromModem*1000+uCompSearchIndex*100+uLlrCombStat*10+bHarqEnable",
            zero,
        ),
        ("handover_reconfig_status", zero),
        ("ul_tx_skip_qci_flags", zero),
        (
            "dlca_isPCellCaUeOn*1000+dlca_isSCellCaUeOn*100+ulca_isPCellCaUeOn*10+ulca_isSCellCaUeOn",
            zero,
        ),
    ];
    LogRecord {
        tag: Tag::DppBasic,
        tag_raw: None,
        secondary_tag: Some(SecondaryTag::Stub),
        index: -1,
        pb_matching_index: Some(grant.index),
        timestamp_str: "Error".to_string(),
        mac_time: Some(0),
        sector_id: grant.sector_id,
        ue_id: grant.ue_id,
        process_id: grant.process_id,
        is_stub: true,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grant(index: i64, mac_time: i64) -> LogRecord {
        LogRecord {
            tag: Tag::PbBasic,
            tag_raw: None,
            secondary_tag: None,
            index,
            pb_matching_index: None,
            timestamp_str: "240101|12:00:00.1".to_string(),
            mac_time: Some(mac_time),
            sector_id: Some(1),
            ue_id: Some(21),
            process_id: Some(4),
            is_stub: false,
            fields: vec![
                ("macgps_time", FieldValue::Int(mac_time)),
                ("u_rnti", FieldValue::Int(52)),
                ("u_mcs_level", FieldValue::Int(10)),
                ("u_service_type", FieldValue::Int(1)),
                ("u_size", FieldValue::Int(320)),
                ("u_rb_cnt", FieldValue::Int(25)),
            ],
        }
    }

    fn data(mac_time: i64) -> LogRecord {
        LogRecord {
            tag: Tag::DppBasic,
            tag_raw: None,
            secondary_tag: Some(SecondaryTag::Unmatched),
            index: 0,
            pb_matching_index: Some(-1),
            timestamp_str: "240101|12:00:00.2".to_string(),
            mac_time: Some(mac_time),
            sector_id: Some(1),
            ue_id: Some(21),
            process_id: Some(4),
            is_stub: false,
            fields: vec![("macgps_time", FieldValue::Int(mac_time))],
        }
    }

    #[test]
    fn matches_grant_six_ticks_back() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(7, 100));
        let mut record = data(106);
        assert!(engine.try_match(&mut record));
        assert_eq!(record.secondary_tag, Some(SecondaryTag::Matched));
        assert_eq!(record.pb_matching_index, Some(7));
        assert_eq!(engine.pending_len(), 0);
    }

    #[test]
    fn falls_back_to_eight_tick_offset() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(3, 100));
        let mut record = data(108);
        assert!(engine.try_match(&mut record));
        assert_eq!(record.pb_matching_index, Some(3));
    }

    #[test]
    fn six_tick_offset_wins_over_eight() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(1, 100));
        engine.insert_grant(grant(2, 102));
        // Data at 108: offset 6 points at the grant issued at 102.
        let mut record = data(108);
        assert!(engine.try_match(&mut record));
        assert_eq!(record.pb_matching_index, Some(2));
        assert_eq!(engine.pending_len(), 1);
    }

    #[test]
    fn matches_across_counter_wrap() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(9, 40_957));
        // 40957 + 6 wraps to 3.
        let mut record = data(3);
        assert!(engine.try_match(&mut record));
        assert_eq!(record.pb_matching_index, Some(9));
    }

    #[test]
    fn eight_tick_offset_also_wraps() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(4, 40_955));
        // 40955 + 8 wraps to 3; the offset-6 candidate (40957) misses.
        let mut record = data(3);
        assert!(engine.try_match(&mut record));
        assert_eq!(record.pb_matching_index, Some(4));
        assert_eq!(engine.pending_len(), 0);
    }

    #[test]
    fn no_match_leaves_record_untouched() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(0, 100));
        let mut record = data(107);
        assert!(!engine.try_match(&mut record));
        assert_eq!(record.secondary_tag, Some(SecondaryTag::Unmatched));
        assert_eq!(record.pb_matching_index, Some(-1));
        assert_eq!(engine.pending_len(), 1);
    }

    #[test]
    fn mismatched_entity_does_not_match() {
        let mut engine = CorrelationEngine::new();
        let mut other = grant(0, 100);
        other.ue_id = Some(22);
        let key_field = other.ue_id;
        engine.insert_grant(other);
        let mut record = data(106);
        assert!(!engine.try_match(&mut record));
        assert_eq!(key_field, Some(22));
    }

    #[test]
    fn sweep_evicts_only_expired_grants() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(0, 100));
        engine.insert_grant(grant(1, 105));
        // At tick 109 the first grant is 9 ticks old, past the window.
        let stubs = engine.sweep(Some(109));
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].pb_matching_index, Some(0));
        assert_eq!(engine.pending_len(), 1);
        // Exactly at the window boundary nothing more ages out.
        assert!(engine.sweep(Some(113)).is_empty());
        assert_eq!(engine.sweep(Some(114)).len(), 1);
    }

    #[test]
    fn sweep_without_current_time_is_a_noop() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(0, 100));
        assert!(engine.sweep(None).is_empty());
        assert_eq!(engine.pending_len(), 1);
    }

    #[test]
    fn sweep_handles_wraparound_ages() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(0, 40_955));
        // Tick 3 after the wrap is 8 ticks later, still inside the window.
        assert!(engine.sweep(Some(3)).is_empty());
        // Tick 4 is 9 ticks later.
        assert_eq!(engine.sweep(Some(4)).len(), 1);
    }

    #[test]
    fn stub_copies_grant_scheduling_fields() {
        let stub = make_stub(&grant(5, 100));
        assert_eq!(stub.tag, Tag::DppBasic);
        assert_eq!(stub.secondary_tag, Some(SecondaryTag::Stub));
        assert!(stub.is_stub);
        assert_eq!(stub.index, -1);
        assert_eq!(stub.pb_matching_index, Some(5));
        assert_eq!(stub.timestamp_str, "Error");
        assert_eq!(stub.sector_id, Some(1));
        assert_eq!(stub.ue_id, Some(21));
        assert_eq!(stub.field_i64("rnti"), Some(52));
        assert_eq!(stub.field_i64("mcs_level"), Some(10));
        assert_eq!(stub.field_i64("rb_cnt"), Some(25));
        assert_eq!(stub.field_i64("u_size"), Some(320));
        assert_eq!(stub.field_i64("call_id"), Some(-1));
        // Same schema as a decoded data record.
        assert_eq!(stub.fields.len(), 31);
    }

    #[test]
    fn sweep_evicts_in_insertion_order() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(2, 105));
        engine.insert_grant(grant(0, 100));
        let stubs = engine.sweep(Some(200));
        let indices: Vec<_> = stubs.iter().filter_map(|s| s.pb_matching_index).collect();
        assert_eq!(indices, vec![2, 0]);
        assert_eq!(engine.pending_len(), 0);
    }

    #[test]
    fn duplicate_grant_key_overwrites_pending_entry() {
        let mut engine = CorrelationEngine::new();
        engine.insert_grant(grant(0, 100));
        engine.insert_grant(grant(9, 100));
        assert_eq!(engine.pending_len(), 1);
        let mut record = data(106);
        assert!(engine.try_match(&mut record));
        assert_eq!(record.pb_matching_index, Some(9));
    }

    proptest! {
        #[test]
        fn wrap_age_is_always_in_range(older in 0..MAC_TIME_WRAP, newer in 0..MAC_TIME_WRAP) {
            let age = wrap_age(older, newer);
            prop_assert!((0..MAC_TIME_WRAP).contains(&age));
        }

        #[test]
        fn advancing_by_offset_matches_back(mac in 0..MAC_TIME_WRAP, offset in 0i64..16) {
            let newer = (mac + offset) % MAC_TIME_WRAP;
            prop_assert_eq!(wrap_age(mac, newer), offset);
        }
    }
}
