//! Admissions sale & confirmation wizard.
//!
//! Sub-forms emit fragments which the aggregator folds into one canonical
//! record. Validation runs per step and category against snapshots of that
//! record, the reconciler decides which messages are shown, the wizard state
//! machine gates navigation and submission, and the transformer turns the
//! record into one of the three backend payloads.

pub mod aggregator;
pub mod credentials;
pub mod domain;
pub mod reconciler;
pub mod record;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod submission;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use aggregator::{AggregationError, FragmentAggregator, MergeReport, RecordObserver};
pub use credentials::{CredentialProvider, StaticCredentials};
pub use domain::{Category, FieldKey, Fragment, FragmentSource, Step};
pub use reconciler::{ErrorMap, ErrorReconciler};
pub use record::{CanonicalRecord, FieldValue};
pub use repository::{RepositoryError, SessionHandle, SessionRepository};
pub use router::admission_router;
pub use service::{
    AdmissionSessionService, OpenSession, PaymentCheck, SessionServiceError, SubmissionReport,
    ValidationReport,
};
pub use session::{AdmissionSession, SessionId, SessionView};
pub use submission::{
    HttpSubmissionTransport, Payload, SubmissionOutcome, SubmissionTransformer,
    SubmissionTransport, SubmissionVariant, TransportError, TransportResponse,
};
pub use validation::{missing_fields_message, ValidationOrchestrator, ValidationResult};
pub use wizard::{WizardError, WizardState, WizardStateMachine};
