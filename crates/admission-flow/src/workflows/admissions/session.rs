use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::aggregator::FragmentAggregator;
use super::domain::Category;
use super::reconciler::{ErrorMap, ErrorReconciler};
use super::record::CanonicalRecord;
use super::validation::ValidationGate;
use super::wizard::{WizardState, WizardStateMachine};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one wizard session owns, from entry until exit.
pub struct AdmissionSession {
    id: SessionId,
    application_no: String,
    pub(crate) aggregator: FragmentAggregator,
    pub(crate) gate: ValidationGate,
    pub(crate) reconciler: ErrorReconciler,
    pub(crate) wizard: WizardStateMachine,
}

impl AdmissionSession {
    pub fn new(
        id: SessionId,
        application_no: impl Into<String>,
        aggregator: FragmentAggregator,
        wizard: WizardStateMachine,
    ) -> Self {
        Self {
            id,
            application_no: application_no.into(),
            aggregator,
            gate: ValidationGate::new(),
            reconciler: ErrorReconciler::new(),
            wizard,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn application_no(&self) -> &str {
        &self.application_no
    }

    pub fn category(&self) -> Category {
        self.wizard.category()
    }

    pub fn record(&self) -> &CanonicalRecord {
        self.aggregator.record()
    }

    pub fn wizard(&self) -> &WizardStateMachine {
        &self.wizard
    }

    pub fn reconciler(&self) -> &ErrorReconciler {
        &self.reconciler
    }

    pub fn view(&self) -> SessionView {
        let record = self.record();
        SessionView {
            session_id: self.id.clone(),
            application_no: self.application_no.clone(),
            step: self.wizard.state(),
            category: self.wizard.category(),
            submitting: self.wizard.is_submitting(),
            success: self.wizard.is_success(),
            record_version: record.version(),
            record: record.to_json(),
            visible_errors: self.reconciler.visible_errors(),
            last_error: self.wizard.last_error().map(str::to_string),
        }
    }
}

/// Session state exposed to API callers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub application_no: String,
    pub step: WizardState,
    pub category: Category,
    pub submitting: bool,
    pub success: bool,
    pub record_version: u64,
    pub record: Value,
    pub visible_errors: ErrorMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
