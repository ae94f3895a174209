//! Outbound payloads, their construction and their delivery.

mod coerce;
mod payload;
mod transform;
mod transport;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Category;
use super::record::CanonicalRecord;

pub use payload::{
    AddressDetails, CompleteSalePayload, ConcessionEntry, ConfirmationPayload, ParentEntry,
    Payload, PaymentDetails, SaleCore, SaleOnlyPayload, SiblingEntry,
};
pub use transform::{SubmissionTransformer, TransformError, HANDOFF_REQUIRED_FIELDS};
pub use transport::{
    classify, HttpSubmissionTransport, SubmissionTransport, TransportError, TransportResponse,
    SERIALIZATION_SUCCESS_MARKER,
};

/// The three backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionVariant {
    CompleteSale,
    SaleOnly,
    Confirmation,
}

impl SubmissionVariant {
    pub const fn path(self) -> &'static str {
        match self {
            SubmissionVariant::CompleteSale => "/api/student-admissions-sale/create",
            SubmissionVariant::SaleOnly => "/api/student-admissions-sale/create/sale/only",
            SubmissionVariant::Confirmation => "/api/application-confirmation/confirm",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SubmissionVariant::CompleteSale => "complete_sale",
            SubmissionVariant::SaleOnly => "sale_only",
            SubmissionVariant::Confirmation => "confirmation",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "complete_sale" => Some(SubmissionVariant::CompleteSale),
            "sale_only" => Some(SubmissionVariant::SaleOnly),
            "confirmation" => Some(SubmissionVariant::Confirmation),
            _ => None,
        }
    }
}

/// Classified result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<serde_json::Value>,
    },
    /// Saved server-side even though the response could not be serialized.
    SuccessViaShim,
    Failure {
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        message: String,
    },
}

impl SubmissionOutcome {
    pub fn is_persisted(&self) -> bool {
        !matches!(self, SubmissionOutcome::Failure { .. })
    }
}

/// Per-attempt inputs that do not come from the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionContext {
    pub application_no: i64,
    pub operator_id: i64,
    pub now: DateTime<Utc>,
}

/// What the confirmation leg starts from after a sale-only handoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Handoff {
    pub record: CanonicalRecord,
    pub category: Category,
}

impl Serialize for Handoff {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Handoff", 2)?;
        state.serialize_field("record", &self.record.to_json())?;
        state.serialize_field("category", &self.category)?;
        state.end()
    }
}
