use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::domain::{FieldKey, Fragment, FragmentSource};
use super::record::{CanonicalRecord, FieldValue};

/// Downstream consumer notified after every accepted merge.
pub trait RecordObserver: Send + Sync {
    fn record_changed(&self, version: u64, changed: &[FieldKey]);
}

/// What a single merge did to the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub accepted: bool,
    pub version: u64,
    pub changed: Vec<FieldKey>,
    pub ignored: Vec<String>,
}

/// The record to validate was not a structured object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No form data provided for validation")]
pub struct AggregationError;

/// Sole owner and writer of the canonical record.
pub struct FragmentAggregator {
    record: CanonicalRecord,
    last_seen: HashMap<FragmentSource, Map<String, Value>>,
    observers: Vec<Arc<dyn RecordObserver>>,
}

impl Default for FragmentAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentAggregator {
    pub fn new() -> Self {
        Self::with_record(CanonicalRecord::new())
    }

    pub fn with_record(record: CanonicalRecord) -> Self {
        Self {
            record,
            last_seen: HashMap::new(),
            observers: Vec::new(),
        }
    }

    /// Coerce a flat JSON document into a record.
    ///
    /// No source context is available here, so the ambiguous `city` key is
    /// ignored; callers spell out `orientationCity` / `addressCity` instead.
    pub fn record_from_document(
        document: &Value,
    ) -> Result<(CanonicalRecord, Vec<String>), AggregationError> {
        let Value::Object(map) = document else {
            return Err(AggregationError);
        };
        let mut record = CanonicalRecord::new();
        let mut ignored = Vec::new();
        for (wire, value) in map {
            match FieldKey::from_wire(wire) {
                Some(key) => {
                    record.apply(key, FieldValue::from_json(value.clone()));
                }
                None => ignored.push(wire.clone()),
            }
        }
        Ok((record, ignored))
    }

    pub fn subscribe(&mut self, observer: Arc<dyn RecordObserver>) {
        self.observers.push(observer);
    }

    pub fn record(&self) -> &CanonicalRecord {
        &self.record
    }

    pub fn into_record(self) -> CanonicalRecord {
        self.record
    }

    /// Merge one fragment; keys it omits are left untouched.
    pub fn merge(&mut self, fragment: Fragment) -> MergeReport {
        let Fragment { source, values } = fragment;

        if self.last_seen.get(&source) == Some(&values) {
            tracing::debug!(?source, "duplicate fragment suppressed");
            return MergeReport {
                accepted: false,
                version: self.record.version(),
                changed: Vec::new(),
                ignored: Vec::new(),
            };
        }

        let mut changed = Vec::new();
        let mut ignored = Vec::new();
        for (wire, value) in &values {
            let Some(key) = source.resolve_key(wire) else {
                ignored.push(wire.clone());
                continue;
            };
            let value = FieldValue::from_json(value.clone());
            // Header refreshes never blank out what the orientation section chose.
            if source == FragmentSource::StatusHeader
                && !value.as_ref().is_some_and(FieldValue::is_present)
            {
                continue;
            }
            if self.record.apply(key, value) {
                changed.push(key);
            }
        }

        if !ignored.is_empty() {
            tracing::warn!(?source, keys = ?ignored, "ignoring undeclared fragment keys");
        }

        self.last_seen.insert(source, values);
        let version = self.record.bump_version();
        tracing::debug!(?source, version, changed = changed.len(), "fragment merged");

        for observer in &self.observers {
            observer.record_changed(version, &changed);
        }

        MergeReport {
            accepted: true,
            version,
            changed,
            ignored,
        }
    }
}
