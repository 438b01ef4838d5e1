// SPDX-License-Identifier: Apache-2.0

//! Scenario-driven line decoders.
//!
//! A replay run names a scenario, the scenario names an ordered list of tag
//! tables, and the decoder tries each table's line pattern in turn. Lines
//! matching no table are skipped without consuming a record index. Field
//! extraction is lenient: short payloads and unparsable tokens degrade to
//! missing fields, never to a rejected line.

pub mod tables;

use std::sync::Arc;

use regex::Regex;

use crate::batcher::label_value;
use crate::metrics::ReplayMetrics;
use crate::record::{FieldValue, LogRecord, SecondaryTag, Tag};

use self::tables::{FieldSource, TagSpec};

/// Replay scenario, selecting which line tags are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Scenario {
    #[display("4G_BASIC")]
    FourGBasic,
    #[display("5G")]
    FiveG,
    #[display("4G_STATE_CHANGE")]
    FourGStateChange,
    /// Unknown scenario name; decodes nothing.
    #[display("IDLE")]
    Idle,
}

impl Scenario {
    /// Parses a scenario name; anything unrecognized maps to [`Scenario::Idle`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "4G_BASIC" => Scenario::FourGBasic,
            "5G" => Scenario::FiveG,
            "4G_STATE_CHANGE" => Scenario::FourGStateChange,
            _ => Scenario::Idle,
        }
    }

    /// Tag tables tried in order for each line of this scenario.
    #[must_use]
    pub fn tag_specs(self) -> &'static [TagSpec] {
        match self {
            Scenario::FourGBasic => &[tables::DPP_BASIC, tables::PB_BASIC],
            Scenario::FiveG => &[
                tables::URAC_RA,
                tables::UMRC_DP,
                tables::ULCA_PHR_PWR_AL,
            ],
            Scenario::FourGStateChange => &[
                tables::SCELL_STATE_ULCA,
                tables::PCELL_STATE_ULCA,
                tables::PCELL_STATE_CHANGE,
                tables::PCELL_STATE_ACT,
            ],
            Scenario::Idle => &[],
        }
    }
}

/// Per-tag record counters for one replay run. The per-tag value becomes
/// each record's `index`; the sum drives synthetic timestamp spacing.
#[derive(Debug, Clone, Default)]
pub struct TagCounters {
    counts: [i64; Tag::COUNT],
}

impl TagCounters {
    #[must_use]
    pub fn get(&self, tag: Tag) -> i64 {
        self.counts[tag.as_index()]
    }

    pub fn bump(&mut self, tag: Tag) {
        self.counts[tag.as_index()] += 1;
    }

    /// Total records decoded across all tags.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }
}

struct CompiledTag {
    spec: TagSpec,
    re: Regex,
}

/// Decoder for one replay run.
pub struct ScenarioDecoder {
    tags: Vec<CompiledTag>,
    counters: TagCounters,
    user: String,
    filename: String,
    metrics: Arc<ReplayMetrics>,
}

/// Shared line prefix: `YYMMDD|HH:MM:SS.ffffff @slot|hexid|decid ... > TAG,payload`.
/// The payload runs to the first parenthesized trailer or end of line.
fn line_pattern(token: &str) -> String {
    format!(
        r"^\s*(?P<date>\d{{6}})\|(?P<time>\d{{2}}:\d{{2}}:\d{{2}}\.\d+)\s+@(?P<slot>\d{{1,3}})\|(?P<id1>[0-9A-Fa-f]+)\|(?P<id2>\d+)\s+[^>]*>\s*{token},(?P<payload>.*?)(?:\s+\(|$)"
    )
}

/// Lenient integer coercion: empty or unparsable tokens become `None`,
/// decimal-looking tokens are truncated toward zero.
fn safe_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

/// `10 * log10(v)` for positive integers, missing otherwise.
fn safe_log10(value: Option<i64>) -> FieldValue {
    match value {
        Some(v) if v > 0 => FieldValue::Float(10.0 * (v as f64).log10()),
        _ => FieldValue::Missing,
    }
}

impl ScenarioDecoder {
    #[must_use]
    pub fn new(
        scenario: Scenario,
        user: impl Into<String>,
        filename: impl Into<String>,
        metrics: Arc<ReplayMetrics>,
    ) -> Self {
        let tags = scenario
            .tag_specs()
            .iter()
            .map(|spec| {
                #[allow(clippy::expect_used)]
                let re = Regex::new(&line_pattern(spec.line_token))
                    .expect("static line pattern compiles");
                CompiledTag { spec: *spec, re }
            })
            .collect();
        ScenarioDecoder {
            tags,
            counters: TagCounters::default(),
            user: user.into(),
            filename: filename.into(),
            metrics,
        }
    }

    #[must_use]
    pub fn counters(&self) -> &TagCounters {
        &self.counters
    }

    /// Decodes one raw line. Returns `None` when no tag table matches.
    pub fn decode(&mut self, raw_line: &str) -> Option<LogRecord> {
        if self.tags.is_empty() {
            return None;
        }
        self.metrics.incr_lines(&self.user, &self.filename);

        for compiled in &self.tags {
            let Some(caps) = compiled.re.captures(raw_line) else {
                continue;
            };
            let spec = &compiled.spec;
            let timestamp_str = format!("{}|{}", &caps["date"], &caps["time"]);
            let payload = caps["payload"].trim();
            let columns: Vec<&str> = payload.split(',').map(str::trim).collect();
            let cf = |i: usize| columns.get(i - 1).copied();

            let mut fields = Vec::with_capacity(spec.fields.len());
            for field in spec.fields {
                let value = match field.source {
                    FieldSource::Column(i) => FieldValue::from_opt(safe_int(cf(i))),
                    FieldSource::Log10(i) => safe_log10(safe_int(cf(i))),
                    // Euclidean remainder so negative values still land in
                    // [0, 1000), matching the source system's derivation.
                    FieldSource::Mod1000(i) => match safe_int(cf(i)) {
                        Some(v) => FieldValue::Int(v.rem_euclid(1000)),
                        None => FieldValue::Int(0),
                    },
                    FieldSource::Div1000(i) => match safe_int(cf(i)) {
                        Some(v) => FieldValue::Float(v as f64 / 1000.0),
                        None => FieldValue::Int(0),
                    },
                    FieldSource::Fixed => FieldValue::Missing,
                };
                fields.push((field.name, value));
            }

            let lookup = |name: &str| {
                fields
                    .iter()
                    .find(|(n, _)| *n == name)
                    .and_then(|(_, v)| v.as_i64())
            };
            let mac_time = lookup("macgps_time");
            let sector_id = lookup("sector_id");
            let ue_id = lookup(spec.entity_field);
            let process_id = spec.process_field.and_then(lookup);

            let index = self.counters.get(spec.tag);
            self.counters.bump(spec.tag);

            let (secondary_tag, pb_matching_index) = if spec.tag == Tag::DppBasic {
                (Some(SecondaryTag::Unmatched), Some(-1))
            } else {
                (None, None)
            };

            let record = LogRecord {
                tag: spec.tag,
                tag_raw: spec.tag_raw,
                secondary_tag,
                index,
                pb_matching_index,
                timestamp_str,
                mac_time,
                sector_id,
                ue_id,
                process_id,
                is_stub: false,
                fields,
            };

            let sector_label = label_value(record.sector_id);
            self.metrics
                .incr_tag(spec.counter, &self.user, &self.filename, &sector_label);
            let crc = record.field_i64("crc");
            let crc_failed = match spec.tag {
                Tag::DppBasic => crc == Some(1),
                Tag::UmrcDp => crc == Some(0),
                _ => false,
            };
            if crc_failed {
                self.metrics
                    .incr_crc_fail(&self.user, &self.filename, &sector_label);
            }
            return Some(record);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(scenario: Scenario) -> ScenarioDecoder {
        ScenarioDecoder::new(scenario, "alice", "trace.log", Arc::new(ReplayMetrics::new()))
    }

    fn dpp_line(mac: i64, sector: i64, ue: i64, crc: i64, process: i64) -> String {
        format!(
            "240101|12:00:00.123456 @0|1F|2 UL MAC SCHED> DPP_BASIC,{mac},{sector},{ue},7,{crc},0,{process},52,10,1,320,3,0,0,0,0,25,0,0,0,12,14,100,1,0,5,0,0,0,0,1011"
        )
    }

    #[test]
    fn decodes_dpp_basic_line() {
        let mut decoder = decoder(Scenario::FourGBasic);
        let record = decoder.decode(&dpp_line(100, 1, 21, 0, 4)).unwrap();
        assert_eq!(record.tag, Tag::DppBasic);
        assert_eq!(record.secondary_tag, Some(SecondaryTag::Unmatched));
        assert_eq!(record.pb_matching_index, Some(-1));
        assert_eq!(record.index, 0);
        assert_eq!(record.timestamp_str, "240101|12:00:00.123456");
        assert_eq!(record.mac_time, Some(100));
        assert_eq!(record.sector_id, Some(1));
        assert_eq!(record.ue_id, Some(21));
        assert_eq!(record.process_id, Some(4));
        assert_eq!(record.field_i64("rnti"), Some(52));
        assert_eq!(record.fields.len(), 31);
    }

    #[test]
    fn per_tag_indices_advance_independently() {
        let mut decoder = decoder(Scenario::FourGBasic);
        let first = decoder.decode(&dpp_line(100, 1, 21, 0, 4)).unwrap();
        let second = decoder.decode(&dpp_line(101, 1, 21, 0, 5)).unwrap();
        let pb = decoder
            .decode("240101|12:00:00.2 @1|2A|3 UL MAC SCHED> PB_BASIC,102,1,21,7,0,0,8,1,10,0,0,320,4,0,25,52")
            .unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        assert_eq!(pb.index, 0);
        assert_eq!(decoder.counters().total(), 3);
    }

    #[test]
    fn unrecognized_line_is_skipped() {
        let mut decoder = decoder(Scenario::FourGBasic);
        assert!(decoder.decode("some unrelated console output").is_none());
        assert!(decoder
            .decode("240101|12:00:00.1 @0|1F|2 UL MAC SCHED> URAC_RA,1,2,3")
            .is_none());
        assert_eq!(decoder.counters().total(), 0);
    }

    #[test]
    fn short_payload_yields_missing_fields() {
        let mut decoder = decoder(Scenario::FourGBasic);
        let record = decoder
            .decode("240101|12:00:00.1 @0|1F|2 UL MAC SCHED> DPP_BASIC,100,1,21")
            .unwrap();
        assert_eq!(record.mac_time, Some(100));
        assert_eq!(record.field("crc"), Some(FieldValue::Missing));
        assert_eq!(record.process_id, None);
        assert_eq!(record.fields.len(), 31);
    }

    #[test]
    fn parenthesized_trailer_is_excluded_from_payload() {
        let mut decoder = decoder(Scenario::FourGBasic);
        let record = decoder
            .decode("240101|12:00:00.1 @0|1F|2 UL MAC SCHED> DPP_BASIC,100,1,21,7,0 (decoded at offset 42)")
            .unwrap();
        assert_eq!(record.field_i64("crc"), Some(0));
        assert_eq!(record.field("retx_cnt"), Some(FieldValue::Missing));
    }

    #[test]
    fn decimal_tokens_truncate_toward_zero() {
        assert_eq!(safe_int(Some("12.9")), Some(12));
        assert_eq!(safe_int(Some("-3.7")), Some(-3));
        assert_eq!(safe_int(Some(" 42 ")), Some(42));
        assert_eq!(safe_int(Some("")), None);
        assert_eq!(safe_int(Some("xyz")), None);
        assert_eq!(safe_int(None), None);
    }

    #[test]
    fn sinr_fields_are_log_transformed() {
        let mut decoder = decoder(Scenario::FiveG);
        let record = decoder
            .decode("240101|12:00:00.1 @0|1F|2 UL MAC SCHED> UMRC_DP,100,1,21,5,1,1,52,0,0,0,3,10,0,25,0,0,320,0,0,0,0,0,1,0,0,0,1000,0,100")
            .unwrap();
        assert_eq!(record.tag, Tag::UmrcDp);
        assert_eq!(record.field("SINR[0]"), Some(FieldValue::Float(30.0)));
        // Zero and negative inputs have no log form.
        assert_eq!(record.field("SINR[1]"), Some(FieldValue::Missing));
        assert_eq!(record.field("preSINR[0]"), Some(FieldValue::Float(20.0)));
    }

    #[test]
    fn state_change_variant_splits_backhaul_column() {
        let mut decoder = decoder(Scenario::FourGStateChange);
        let record = decoder
            .decode("240101|12:00:00.1 @0|1F|2 CA STATE> PCELL_STATE_CHANGE,100,0,1,21,2,1,3,5,0,0,10,0,0,1,0,20,1,0,0,3,1,7,4,8,2500")
            .unwrap();
        assert_eq!(record.tag, Tag::PcellState);
        assert_eq!(record.tag_raw, Some("PCELL_STATE_CHANGE"));
        assert_eq!(record.sector_id, Some(1));
        assert_eq!(record.ue_id, Some(21));
        assert_eq!(
            record.field("is_inter_site_ca_config_on"),
            Some(FieldValue::Int(500))
        );
        assert_eq!(record.field("backhaul_outage"), Some(FieldValue::Float(2.5)));
    }

    #[test]
    fn backhaul_split_keeps_negative_values_in_range() {
        let mut decoder = decoder(Scenario::FourGStateChange);
        let record = decoder
            .decode("240101|12:00:00.1 @0|1F|2 CA STATE> PCELL_STATE_CHANGE,100,0,1,21,2,1,3,5,0,0,10,0,0,1,0,20,1,0,0,3,1,7,4,8,-2500")
            .unwrap();
        // -2500 = -3 * 1000 + 500; the remainder stays in [0, 1000).
        assert_eq!(
            record.field("is_inter_site_ca_config_on"),
            Some(FieldValue::Int(500))
        );
        assert_eq!(
            record.field("backhaul_outage"),
            Some(FieldValue::Float(-2.5))
        );
    }

    #[test]
    fn idle_scenario_decodes_nothing() {
        let mut decoder = decoder(Scenario::Idle);
        assert!(decoder.decode(&dpp_line(100, 1, 21, 0, 4)).is_none());
    }

    #[test]
    fn scenario_names_round_trip() {
        assert_eq!(Scenario::from_name("4G_BASIC"), Scenario::FourGBasic);
        assert_eq!(Scenario::from_name("5G"), Scenario::FiveG);
        assert_eq!(
            Scenario::from_name("4G_STATE_CHANGE"),
            Scenario::FourGStateChange
        );
        assert_eq!(Scenario::from_name("6G"), Scenario::Idle);
        assert_eq!(Scenario::FourGBasic.to_string(), "4G_BASIC");
    }
}
