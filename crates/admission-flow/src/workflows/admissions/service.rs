use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::ValidationSettings;

use super::aggregator::{AggregationError, FragmentAggregator, MergeReport, RecordObserver};
use super::credentials::CredentialProvider;
use super::domain::{Category, Fragment, Step};
use super::reconciler::ErrorMap;
use super::record::CanonicalRecord;
use super::repository::{RepositoryError, SessionHandle, SessionRepository};
use super::session::{AdmissionSession, SessionId, SessionView};
use super::submission::{
    classify, Handoff, SubmissionOutcome, SubmissionTransformer, SubmissionTransport,
    SubmissionVariant, TransformError,
};
use super::validation::{missing_fields_message, ValidationOrchestrator, ValidationResult};
use super::wizard::{WizardError, WizardState, WizardStateMachine};

/// Request to open a wizard session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenSession {
    pub application_no: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Present when arriving from a sale-only handoff; the session starts at step 2.
    #[serde(default)]
    pub handoff_category: Option<String>,
    #[serde(default)]
    pub initial_category: Option<String>,
    #[serde(default)]
    pub initial_values: Option<Value>,
}

/// Result of a validation request.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub step: Step,
    pub superseded: bool,
    #[serde(flatten)]
    pub result: ValidationResult,
}

/// Result of the combined pre-payment check.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentCheck {
    #[serde(flatten)]
    pub result: ValidationResult,
    pub summary: String,
}

/// Result of a submission attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
    pub state: WizardState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff: Option<Handoff>,
}

/// Composes aggregation, validation, reconciliation, the wizard and submission per session.
pub struct AdmissionSessionService<R, T> {
    repository: Arc<R>,
    transport: Arc<T>,
    transformer: SubmissionTransformer,
    orchestrator: ValidationOrchestrator,
    observers: Vec<Arc<dyn RecordObserver>>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("adm-{id:06}"))
}

fn lock(handle: &SessionHandle) -> Result<MutexGuard<'_, AdmissionSession>, SessionServiceError> {
    handle.lock().map_err(|_| {
        SessionServiceError::Repository(RepositoryError::Unavailable(
            "session lock poisoned".to_string(),
        ))
    })
}

impl<R, T> AdmissionSessionService<R, T>
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    pub fn new(
        repository: Arc<R>,
        transport: Arc<T>,
        credentials: Arc<dyn CredentialProvider>,
        settings: ValidationSettings,
    ) -> Self {
        Self {
            repository,
            transport,
            transformer: SubmissionTransformer::new(credentials),
            orchestrator: ValidationOrchestrator::new(settings),
            observers: Vec::new(),
        }
    }

    /// Observer attached to the aggregator of every session opened afterwards.
    pub fn with_observer(mut self, observer: Arc<dyn RecordObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn orchestrator(&self) -> &ValidationOrchestrator {
        &self.orchestrator
    }

    fn session(&self, id: &SessionId) -> Result<SessionHandle, SessionServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| SessionServiceError::NotFound(id.clone()))
    }

    pub fn open(&self, request: OpenSession) -> Result<SessionView, SessionServiceError> {
        let OpenSession {
            application_no,
            category,
            handoff_category,
            initial_category,
            initial_values,
        } = request;

        let category = Category::resolve([
            category.as_deref(),
            handoff_category.as_deref(),
            initial_category.as_deref(),
        ]);
        let record = match &initial_values {
            Some(values) => FragmentAggregator::record_from_document(values)?.0,
            None => CanonicalRecord::new(),
        };

        let mut aggregator = FragmentAggregator::with_record(record);
        for observer in &self.observers {
            aggregator.subscribe(observer.clone());
        }
        let wizard = if handoff_category.is_some() {
            WizardStateMachine::resume_confirmation(category)
        } else {
            WizardStateMachine::new(category)
        };

        let session = AdmissionSession::new(next_session_id(), application_no, aggregator, wizard);
        let handle = self.repository.insert(session)?;
        let view = lock(&handle)?.view();
        info!(session = %view.session_id, category = category.label(), "admission session opened");
        Ok(view)
    }

    pub fn view(&self, id: &SessionId) -> Result<SessionView, SessionServiceError> {
        let handle = self.session(id)?;
        let view = lock(&handle)?.view();
        Ok(view)
    }

    pub fn close(&self, id: &SessionId) -> Result<(), SessionServiceError> {
        self.session(id)?;
        self.repository.remove(id)?;
        Ok(())
    }

    /// Merge a fragment; edited fields lose any stale external error.
    pub fn merge_fragment(
        &self,
        id: &SessionId,
        fragment: Fragment,
    ) -> Result<MergeReport, SessionServiceError> {
        let handle = self.session(id)?;
        let mut session = lock(&handle)?;
        let report = session.aggregator.merge(fragment);
        for key in &report.changed {
            session.reconciler.clear(key.as_str());
        }
        Ok(report)
    }

    /// Validate a step against a snapshot; a newer request for the same step wins.
    pub fn validate(
        &self,
        id: &SessionId,
        step: Option<Step>,
    ) -> Result<ValidationReport, SessionServiceError> {
        let handle = self.session(id)?;
        let ticket = {
            let mut session = lock(&handle)?;
            let step = step
                .or_else(|| session.wizard.state().step())
                .unwrap_or(Step::Confirmation);
            let category = session.category();
            let record = session.aggregator.record().clone();
            session.gate.begin(step, category, &record)
        };

        let result =
            self.orchestrator
                .validate_step(ticket.snapshot(), ticket.step(), ticket.category());

        let mut session = lock(&handle)?;
        let (result, superseded) = match session.gate.finish(&ticket, result.clone()) {
            Some(current) => {
                session.reconciler.replace_local(&current);
                (current, false)
            }
            None => (result, true),
        };
        Ok(ValidationReport {
            step: ticket.step(),
            superseded,
            result,
        })
    }

    /// Everything up to the current step, run before payment; reveals all local errors.
    pub fn check_before_payment(&self, id: &SessionId) -> Result<PaymentCheck, SessionServiceError> {
        let handle = self.session(id)?;
        let mut session = lock(&handle)?;
        let current_step = session.wizard.state().step().unwrap_or(Step::Confirmation);
        let result = self.orchestrator.validate_through(
            session.record(),
            current_step,
            session.category(),
        );
        session.reconciler.replace_local(&result);
        session.reconciler.mark_submitted(true);
        let summary = missing_fields_message(&result);
        Ok(PaymentCheck { result, summary })
    }

    pub fn push_external_errors(
        &self,
        id: &SessionId,
        errors: ErrorMap,
    ) -> Result<ErrorMap, SessionServiceError> {
        let handle = self.session(id)?;
        let mut session = lock(&handle)?;
        session.reconciler.push_external(errors);
        Ok(session.reconciler.visible_errors())
    }

    pub fn clear_external_error(
        &self,
        id: &SessionId,
        field: &str,
    ) -> Result<Option<String>, SessionServiceError> {
        let handle = self.session(id)?;
        let cleared = lock(&handle)?.reconciler.clear(field);
        Ok(cleared)
    }

    pub fn mark_touched(&self, id: &SessionId, field: &str) -> Result<ErrorMap, SessionServiceError> {
        let handle = self.session(id)?;
        let mut session = lock(&handle)?;
        session.reconciler.mark_touched(field);
        Ok(session.reconciler.visible_errors())
    }

    pub fn advance(&self, id: &SessionId) -> Result<WizardState, SessionServiceError> {
        let handle = self.session(id)?;
        let state = lock(&handle)?.wizard.advance()?;
        Ok(state)
    }

    pub fn retreat(&self, id: &SessionId) -> Result<WizardState, SessionServiceError> {
        let handle = self.session(id)?;
        let state = lock(&handle)?.wizard.retreat()?;
        Ok(state)
    }

    /// Submit the current record. The session is never locked while the backend is awaited.
    pub async fn submit(
        &self,
        id: &SessionId,
        variant: SubmissionVariant,
        handoff: bool,
    ) -> Result<SubmissionReport, SessionServiceError> {
        let handle = self.session(id)?;
        let handoff = handoff && variant == SubmissionVariant::SaleOnly;
        let (record, category, application_no) = {
            let session = lock(&handle)?;
            if handoff {
                SubmissionTransformer::precheck_handoff(session.record())?;
            }
            (
                session.record().clone(),
                session.category(),
                session.application_no().to_string(),
            )
        };

        // Built unlocked and before the slot is taken, so bad record data cannot strand the flag.
        let payload = self
            .transformer
            .build(&record, variant, category, &application_no);
        let permit = lock(&handle)?.wizard.begin_submission(variant, handoff)?;

        info!(session = %id, variant = variant.label(), "submitting admission");
        let credential = self.transformer.credential();
        let response = self
            .transport
            .submit(variant, &payload, credential.as_deref())
            .await;
        let outcome = classify(variant, response);

        let mut session = lock(&handle)?;
        let handoff = permit.handoff();
        let state = session.wizard.finish_submission(permit, &outcome);
        let handoff = (handoff && outcome.is_persisted()).then(|| Handoff {
            record: session.record().clone(),
            category: session.category(),
        });
        info!(
            session = %id,
            variant = variant.label(),
            persisted = outcome.is_persisted(),
            state = state.label(),
            "admission submission finished"
        );

        Ok(SubmissionReport {
            outcome,
            state,
            handoff,
        })
    }
}

/// Error raised by the admission session service.
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    IncompleteHandoff(#[from] TransformError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
