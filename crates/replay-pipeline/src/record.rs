// SPDX-License-Identifier: Apache-2.0

//! Typed form of one decoded diagnostic log line.
//!
//! A [`LogRecord`] is produced once by a decoder and is immutable afterwards,
//! with one exception: the correlation engine may set `secondary_tag` and
//! `pb_matching_index` exactly once when a data record finds its grant.
//!
//! Serialization preserves the exact key order of the source system's wire
//! form, because downstream dashboards address fields positionally:
//! `tag`, [`tag_raw`], [`secondary_tag`], `index`, [`pb_matching_index`],
//! `timestamp_str`, then the tag-specific payload fields in table order,
//! and a trailing `is_stub` marker on synthesized records.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Period of the MAC time counter embedded in each line. The counter
/// increases monotonically but wraps back to zero at this value.
pub const MAC_TIME_WRAP: i64 = 40_960;

/// Diagnostic record types recognized by the decoders.
///
/// The three `PCELL_STATE_*` line variants share the logical tag
/// [`Tag::PcellState`] (and one index counter); the concrete variant name
/// travels in the record's `tag_raw` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    DppBasic,
    PbBasic,
    UracRa,
    UmrcDp,
    UlcaPhrPwrAl,
    ScellStateUlca,
    PcellState,
}

impl Tag {
    /// Number of distinct logical tags, for per-tag counter arrays.
    pub const COUNT: usize = 7;

    /// The tag name as it appears in serialized records and stream labels.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tag::DppBasic => "DPP_BASIC",
            Tag::PbBasic => "PB_BASIC",
            Tag::UracRa => "URAC_RA",
            Tag::UmrcDp => "UMRC_DP",
            Tag::UlcaPhrPwrAl => "ULCA_PHR_PWR_AL",
            Tag::ScellStateUlca => "SCELL_STATE_ULCA",
            Tag::PcellState => "PCELL_STATE_TAG",
        }
    }

    #[must_use]
    pub fn as_index(self) -> usize {
        match self {
            Tag::DppBasic => 0,
            Tag::PbBasic => 1,
            Tag::UracRa => 2,
            Tag::UmrcDp => 3,
            Tag::UlcaPhrPwrAl => 4,
            Tag::ScellStateUlca => 5,
            Tag::PcellState => 6,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Correlation state of a `DPP_BASIC` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryTag {
    /// No grant found for this data record (initial state).
    Unmatched,
    /// Paired with a pending grant by the correlation engine.
    Matched,
    /// Synthesized placeholder for a grant that aged out unmatched.
    Stub,
}

impl SecondaryTag {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SecondaryTag::Unmatched => "UNMATCHED",
            SecondaryTag::Matched => "MATCHED",
            SecondaryTag::Stub => "STUB",
        }
    }
}

/// One extracted payload field.
///
/// Field coercion is tolerant by design: an empty or unparsable token
/// becomes [`FieldValue::Missing`] (serialized as JSON `null`) instead of
/// failing the line. `Float` carries the handful of derived fields that are
/// not integral (log-transformed SINR values and the `/1000` ratio split).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Missing,
}

impl FieldValue {
    /// Integer view of the value. `Float` and `Missing` yield `None`;
    /// comparisons against sentinels are only defined on integral fields.
    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(v),
            FieldValue::Float(_) | FieldValue::Missing => None,
        }
    }

    #[must_use]
    pub fn from_opt(v: Option<i64>) -> Self {
        match v {
            Some(v) => FieldValue::Int(v),
            None => FieldValue::Missing,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::Missing => serializer.serialize_none(),
        }
    }
}

/// The decoded form of one input line.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub tag: Tag,
    /// Concrete line variant for tags that fold several variants into one
    /// logical tag (the `PCELL_STATE_*` family).
    pub tag_raw: Option<&'static str>,
    pub secondary_tag: Option<SecondaryTag>,
    /// Per-tag monotonically increasing counter within one replay run.
    /// Stub records carry `-1`.
    pub index: i64,
    /// Index of the matched grant; `-1` until the correlation engine pairs
    /// the record. Only present on the grant/data pair.
    pub pb_matching_index: Option<i64>,
    /// Verbatim `date|time` token pair from the source line, never reparsed.
    pub timestamp_str: String,
    /// Wrapping MAC time counter, the correlation clock.
    pub mac_time: Option<i64>,
    pub sector_id: Option<i64>,
    pub ue_id: Option<i64>,
    pub process_id: Option<i64>,
    pub is_stub: bool,
    /// Tag-specific payload fields in exact table order.
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl LogRecord {
    /// Looks up a payload field by its table name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Integer value of a payload field, if present and integral.
    #[must_use]
    pub fn field_i64(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(FieldValue::as_i64)
    }

    /// Serialized wire form with the original key order preserved.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("record serialization cannot fail")
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("tag", self.tag.label())?;
        if let Some(raw) = self.tag_raw {
            map.serialize_entry("tag_raw", raw)?;
        }
        if let Some(secondary) = self.secondary_tag {
            map.serialize_entry("secondary_tag", secondary.label())?;
        }
        map.serialize_entry("index", &self.index)?;
        if let Some(pb_index) = self.pb_matching_index {
            map.serialize_entry("pb_matching_index", &pb_index)?;
        }
        map.serialize_entry("timestamp_str", &self.timestamp_str)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        if self.is_stub {
            map.serialize_entry("is_stub", &true)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> LogRecord {
        LogRecord {
            tag: Tag::DppBasic,
            tag_raw: None,
            secondary_tag: Some(SecondaryTag::Unmatched),
            index: 3,
            pb_matching_index: Some(-1),
            timestamp_str: "240101|12:00:00.123".to_string(),
            mac_time: Some(100),
            sector_id: Some(1),
            ue_id: Some(21),
            process_id: Some(4),
            is_stub: false,
            fields: vec![
                ("macgps_time", FieldValue::Int(100)),
                ("sector_id", FieldValue::Int(1)),
                ("crc", FieldValue::Missing),
            ],
        }
    }

    #[test]
    fn serializes_keys_in_declared_order() {
        let json = sample_record().to_json();
        let tag_pos = json.find("\"tag\"").unwrap();
        let secondary_pos = json.find("\"secondary_tag\"").unwrap();
        let index_pos = json.find("\"index\"").unwrap();
        let pb_pos = json.find("\"pb_matching_index\"").unwrap();
        let ts_pos = json.find("\"timestamp_str\"").unwrap();
        let mac_pos = json.find("\"macgps_time\"").unwrap();
        assert!(tag_pos < secondary_pos);
        assert!(secondary_pos < index_pos);
        assert!(index_pos < pb_pos);
        assert!(pb_pos < ts_pos);
        assert!(ts_pos < mac_pos);
        assert!(!json.contains("is_stub"));
    }

    #[test]
    fn missing_serializes_as_null() {
        let json = sample_record().to_json();
        assert!(json.contains("\"crc\":null"));
    }

    #[test]
    fn stub_marker_serialized_last() {
        let mut record = sample_record();
        record.is_stub = true;
        let json = record.to_json();
        assert!(json.ends_with("\"is_stub\":true}"));
    }

    #[test]
    fn field_lookup_by_name() {
        let record = sample_record();
        assert_eq!(record.field_i64("sector_id"), Some(1));
        assert_eq!(record.field_i64("crc"), None);
        assert_eq!(record.field("no_such_field"), None);
    }
}
