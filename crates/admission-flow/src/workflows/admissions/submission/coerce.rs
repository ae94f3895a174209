//! Lenient value coercion for outbound payloads.
//!
//! A zero or empty result counts as absent so that a non-zero default applies,
//! matching how the backend contract was written against form values.

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use super::super::domain::FieldKey;
use super::super::record::{CanonicalRecord, FieldValue};

pub(super) fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(super) fn value_int(value: Option<&FieldValue>) -> Option<i64> {
    value.and_then(FieldValue::as_int).filter(|n| *n != 0)
}

pub(super) fn value_text(value: Option<&FieldValue>, default: &str) -> String {
    match value {
        Some(value) if value.is_present() => value.as_text().into_owned(),
        _ => default.to_string(),
    }
}

pub(super) fn int_or(record: &CanonicalRecord, key: FieldKey, default: i64) -> i64 {
    value_int(record.get(key)).unwrap_or(default)
}

pub(super) fn first_int(record: &CanonicalRecord, keys: &[FieldKey], default: i64) -> i64 {
    keys.iter()
        .find_map(|key| value_int(record.get(*key)))
        .unwrap_or(default)
}

/// Non-zero integer or nothing; serialized as `null` when absent.
pub(super) fn optional_int(record: &CanonicalRecord, key: FieldKey) -> Option<i64> {
    value_int(record.get(key))
}

pub(super) fn float_or(record: &CanonicalRecord, key: FieldKey, default: f64) -> f64 {
    record
        .get(key)
        .and_then(FieldValue::as_float)
        .filter(|n| *n != 0.0)
        .unwrap_or(default)
}

pub(super) fn text_or(record: &CanonicalRecord, key: FieldKey, default: &str) -> String {
    value_text(record.get(key), default)
}

pub(super) fn first_text(record: &CanonicalRecord, keys: &[FieldKey], default: &str) -> String {
    keys.iter()
        .find_map(|key| record.get(*key).filter(|value| value.is_present()))
        .map(|value| value.as_text().into_owned())
        .unwrap_or_else(|| default.to_string())
}

/// Timestamp of the field, or of `now` when it is absent or unparsable.
pub(super) fn timestamp_or_now(record: &CanonicalRecord, key: FieldKey, now: DateTime<Utc>) -> String {
    let instant = record
        .get(key)
        .filter(|value| value.is_present())
        .and_then(FieldValue::as_datetime)
        .unwrap_or(now);
    timestamp(instant)
}

/// Explicit year id, else the last two digits of the first 4-digit year, else 0.
pub(super) fn academic_year_code(record: &CanonicalRecord) -> i64 {
    static YEAR: OnceLock<Regex> = OnceLock::new();

    if let Some(id) = value_int(record.get(FieldKey::AcademicYearId)) {
        return id;
    }
    let Some(FieldValue::Text(display)) = record.get(FieldKey::AcademicYear) else {
        return 0;
    };
    let year = YEAR.get_or_init(|| Regex::new(r"[0-9]{4}").expect("year pattern compiles"));
    year.find(display)
        .and_then(|found| found.as_str().get(2..))
        .and_then(|century_year| century_year.parse::<i64>().ok())
        .unwrap_or(0)
}
