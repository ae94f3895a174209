use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::domain::FieldKey;

/// One stored value of the canonical record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Nested(Value),
}

impl FieldValue {
    /// Map a JSON value onto a stored value; `null` means "clear".
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(FieldValue::Text(text)),
            Value::Number(number) => Some(match number.as_f64() {
                Some(n) => FieldValue::Number(n),
                None => FieldValue::Text(number.to_string()),
            }),
            Value::Bool(flag) => Some(FieldValue::Text(flag.to_string())),
            nested @ (Value::Array(_) | Value::Object(_)) => Some(FieldValue::Nested(nested)),
        }
    }

    /// Non-empty text, a non-zero number, any date or any nested value.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FieldValue::Date(_) => true,
            FieldValue::Nested(value) => !value.is_null(),
        }
    }

    /// String form used by text rules and text payload fields.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(text) => Cow::Borrowed(text.as_str()),
            FieldValue::Number(n) => Cow::Owned(format_number(*n)),
            FieldValue::Date(date) => Cow::Owned(date.format("%Y-%m-%d").to_string()),
            FieldValue::Nested(value) => Cow::Owned(value.to_string()),
        }
    }

    /// Leading integer, the way a lenient form parser reads "12abc" as 12.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Text(text) => leading_int(text),
            FieldValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            FieldValue::Number(_) | FieldValue::Date(_) | FieldValue::Nested(_) => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Text(text) => leading_float(text),
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Number(_) | FieldValue::Date(_) | FieldValue::Nested(_) => None,
        }
    }

    /// Parse as an instant; bare dates are taken at midnight UTC.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(date) => Some(date.and_time(NaiveTime::MIN).and_utc()),
            FieldValue::Text(text) => parse_datetime(text),
            FieldValue::Number(_) | FieldValue::Nested(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_datetime().map(|instant| instant.date_naive())
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            FieldValue::Nested(value) => value.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn leading_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end += 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut fraction = end + 1;
        while fraction < bytes.len() && bytes[fraction].is_ascii_digit() {
            fraction += 1;
            digits += 1;
        }
        end = fraction;
    }
    if digits == 0 {
        return None;
    }
    trimmed[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Accepts RFC 3339, `YYYY-MM-DD` and `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// The single merged record of one wizard session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRecord {
    version: u64,
    values: BTreeMap<FieldKey, FieldValue>,
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, e.g. from a navigation handoff.
    pub fn from_values(values: impl IntoIterator<Item = (FieldKey, FieldValue)>) -> Self {
        Self {
            version: 0,
            values: values.into_iter().collect(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldValue> {
        self.values.get(&key)
    }

    pub fn is_present(&self, key: FieldKey) -> bool {
        self.get(key).is_some_and(FieldValue::is_present)
    }

    /// Text of the field, or `""` when absent.
    pub fn text(&self, key: FieldKey) -> Cow<'_, str> {
        self.get(key)
            .map(FieldValue::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &FieldValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    /// JSON object keyed by wire names.
    pub fn to_json(&self) -> Value {
        let map = self
            .values
            .iter()
            .map(|(key, value)| (key.as_str().to_string(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }

    /// Write or clear one key; returns whether the stored value changed.
    pub(crate) fn apply(&mut self, key: FieldKey, value: Option<FieldValue>) -> bool {
        match value {
            Some(value) => match self.values.get(&key) {
                Some(existing) if *existing == value => false,
                _ => {
                    self.values.insert(key, value);
                    true
                }
            },
            None => self.values.remove(&key).is_some(),
        }
    }

    pub(crate) fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}
