//! Step- and category-aware validation of the canonical record.

mod cross_field;
mod gate;
mod rules;

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::config::ValidationSettings;

use super::aggregator::FragmentAggregator;
use super::domain::{Category, FieldKey, Step};
use super::record::CanonicalRecord;

pub use cross_field::{CrossFieldRule, EMPLOYEE_ID_MESSAGE, PRO_RECEIPT_MESSAGE, STAFF_QUOTA_LABEL};
pub use gate::{ValidationGate, ValidationTicket};
pub use rules::{Check, FieldRule, FieldRuleSet, Format};

/// Which pass produced a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Schema,
    CrossField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Every violation found in one pass, plus an optional record-level error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<FieldKey, FieldError>,
    general: Option<String>,
}

impl ValidationResult {
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            errors: BTreeMap::new(),
            general: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.general.is_none()
    }

    pub fn errors(&self) -> &BTreeMap<FieldKey, FieldError> {
        &self.errors
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general.as_deref()
    }

    pub fn error_for(&self, key: FieldKey) -> Option<&FieldError> {
        self.errors.get(&key)
    }

    pub fn message_for(&self, key: FieldKey) -> Option<&str> {
        self.errors.get(&key).map(|error| error.message.as_str())
    }

    pub fn error_count(&self) -> usize {
        self.errors.len() + usize::from(self.general.is_some())
    }

    fn push(&mut self, key: FieldKey, kind: ErrorKind, message: &str) {
        self.errors.insert(
            key,
            FieldError {
                kind,
                message: message.to_string(),
            },
        );
    }

    /// Fold another pass in; later errors overwrite earlier ones per field.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        if other.general.is_some() {
            self.general = other.general;
        }
    }

    /// Field wire name to message; the record-level error is keyed `general`.
    pub fn messages(&self) -> BTreeMap<String, String> {
        let mut messages = self
            .errors
            .iter()
            .map(|(key, error)| (key.as_str().to_string(), error.message.clone()))
            .collect::<BTreeMap<_, _>>();
        if let Some(general) = &self.general {
            messages.insert("general".to_string(), general.clone());
        }
        messages
    }

    /// Human labels of every failing field, in form order.
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = self
            .errors
            .keys()
            .map(|key| key.label())
            .collect::<Vec<_>>();
        if self.general.is_some() {
            labels.push("Validation Error");
        }
        labels
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationResult", 2)?;
        state.serialize_field("is_valid", &self.is_valid())?;
        state.serialize_field("errors", &self.messages())?;
        state.end()
    }
}

/// One-line summary of what is still missing.
pub fn missing_fields_message(result: &ValidationResult) -> String {
    let labels = result.labels();
    match labels.len() {
        0 => "All required fields are completed.".to_string(),
        1..=3 => format!("Please complete: {}", labels.join(", ")),
        total => format!(
            "Please complete {} required fields: {} and {} more",
            total,
            labels[..3].join(", "),
            total - 3
        ),
    }
}

/// Runs the rule set for a step/category pair followed by the cross-field rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOrchestrator {
    settings: ValidationSettings,
}

impl ValidationOrchestrator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> ValidationSettings {
        self.settings
    }

    pub fn validate_step(
        &self,
        record: &CanonicalRecord,
        step: Step,
        category: Category,
    ) -> ValidationResult {
        self.validate_step_on(record, step, category, Local::now().date_naive())
    }

    /// Same as [`validate_step`](Self::validate_step) with an explicit "today".
    pub fn validate_step_on(
        &self,
        record: &CanonicalRecord,
        step: Step,
        category: Category,
        today: NaiveDate,
    ) -> ValidationResult {
        let rule_set = FieldRuleSet::select(step, category);
        let mut result = ValidationResult::default();

        for rule in rule_set.rules() {
            if let Some(message) = rule.evaluate(record, today) {
                result.push(rule.key, ErrorKind::Schema, message);
            }
        }

        for rule in CrossFieldRule::ALL {
            if let Some(message) = rule.evaluate(record, self.settings.waive_pro_receipt) {
                result.push(rule.target(), ErrorKind::CrossField, message);
            }
        }

        tracing::debug!(
            step = step.label(),
            category = category.label(),
            errors = result.error_count(),
            "validated record"
        );
        result
    }

    /// Pre-payment check: the sale step always, the confirmation step once reached.
    pub fn validate_through(
        &self,
        record: &CanonicalRecord,
        current_step: Step,
        category: Category,
    ) -> ValidationResult {
        let mut result = self.validate_step(record, Step::Sale, category);
        if current_step == Step::Confirmation {
            result.merge(self.validate_step(record, Step::Confirmation, category));
        }
        result
    }

    /// Validate an arbitrary JSON document; non-objects yield a general error.
    pub fn validate_document(
        &self,
        document: &Value,
        step: Step,
        category: Category,
    ) -> ValidationResult {
        match FragmentAggregator::record_from_document(document) {
            Ok((record, _ignored)) => self.validate_step(&record, step, category),
            Err(err) => ValidationResult::general(err.to_string()),
        }
    }
}
