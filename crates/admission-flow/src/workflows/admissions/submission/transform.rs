use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::super::credentials::CredentialProvider;
use super::super::domain::{Category, FieldKey};
use super::super::record::{CanonicalRecord, FieldValue};
use super::coerce::{
    academic_year_code, first_int, first_text, float_or, int_or, optional_int, text_or,
    timestamp, timestamp_or_now, value_int, value_text,
};
use super::payload::{
    AddressDetails, CompleteSalePayload, ConcessionEntry, ConfirmationPayload, ParentEntry,
    Payload, PaymentDetails, SaleCore, SaleOnlyPayload, SiblingEntry,
};
use super::{SubmissionContext, SubmissionVariant};

/// Fields a sale-only submission needs before the flow may continue into confirmation.
pub const HANDOFF_REQUIRED_FIELDS: [FieldKey; 3] =
    [FieldKey::FirstName, FieldKey::AcademicYear, FieldKey::DoorNo];

const PLACEHOLDER: &str = "string";
const MINIMAL_AMOUNT: f64 = 0.1;
const FATHER_RELATION: i64 = 1;
const MOTHER_RELATION: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("Please complete all form sections before proceeding. Missing: {}", .missing.join(", "))]
    IncompleteHandoff { missing: Vec<&'static str> },
}

/// Builds outbound payloads from the canonical record.
#[derive(Clone)]
pub struct SubmissionTransformer {
    credentials: Arc<dyn CredentialProvider>,
}

impl SubmissionTransformer {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    pub fn credential(&self) -> Option<String> {
        self.credentials.credential()
    }

    /// Context for an attempt happening now.
    pub fn context(&self, application_no: &str) -> SubmissionContext {
        SubmissionContext {
            application_no: value_int(Some(&FieldValue::from(application_no))).unwrap_or(0),
            operator_id: self.credentials.operator_id(),
            now: Utc::now(),
        }
    }

    pub fn build(
        &self,
        record: &CanonicalRecord,
        variant: SubmissionVariant,
        category: Category,
        application_no: &str,
    ) -> Payload {
        Self::build_with(record, variant, category, &self.context(application_no))
    }

    /// Deterministic variant of [`build`](Self::build).
    pub fn build_with(
        record: &CanonicalRecord,
        variant: SubmissionVariant,
        category: Category,
        context: &SubmissionContext,
    ) -> Payload {
        match variant {
            SubmissionVariant::CompleteSale => Payload::CompleteSale(CompleteSalePayload {
                sale: sale_core(record, context),
                payment_details: payment_details(record, context, PaymentDefaults::SALE),
            }),
            SubmissionVariant::SaleOnly => Payload::SaleOnly(SaleOnlyPayload {
                sale: sale_core(record, context),
            }),
            SubmissionVariant::Confirmation => {
                Payload::Confirmation(confirmation(record, category, context))
            }
        }
    }

    /// Guard for a sale-only submission that hands off into confirmation.
    pub fn precheck_handoff(record: &CanonicalRecord) -> Result<(), TransformError> {
        let missing = HANDOFF_REQUIRED_FIELDS
            .iter()
            .filter(|key| !record.is_present(**key))
            .map(|key| key.as_str())
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TransformError::IncompleteHandoff { missing })
        }
    }
}

fn sale_core(record: &CanonicalRecord, context: &SubmissionContext) -> SaleCore {
    let created_by = context.operator_id;
    SaleCore {
        first_name: text_or(record, FieldKey::FirstName, ""),
        last_name: text_or(record, FieldKey::Surname, ""),
        gender_id: int_or(record, FieldKey::Gender, 0),
        apaar_no: text_or(record, FieldKey::AaparNo, ""),
        dob: timestamp_or_now(record, FieldKey::DateOfBirth, context.now),
        aadhar_card_no: int_or(record, FieldKey::AadharCardNo, 0),
        quota_id: int_or(record, FieldKey::Quota, 0),
        pro_receipt_no: int_or(record, FieldKey::ProReceiptNo, 0),
        admission_type_id: int_or(record, FieldKey::AdmissionType, 0),
        admission_refered_by: text_or(record, FieldKey::AdmissionReferredBy, ""),
        app_sale_date: timestamp(context.now),
        father_name: text_or(record, FieldKey::FatherName, ""),
        father_mobile_no: int_or(record, FieldKey::PhoneNumber, 0),
        academic_year_id: academic_year_code(record),
        branch_id: int_or(record, FieldKey::BranchId, 0),
        student_type_id: int_or(record, FieldKey::StudentTypeId, 0),
        class_id: int_or(record, FieldKey::JoiningClassId, 0),
        orientation_id: int_or(record, FieldKey::OrientationId, 0),
        app_type_id: first_int(
            record,
            &[FieldKey::AdmissionType, FieldKey::AdmissionTypeId],
            1,
        ),
        address_details: AddressDetails {
            door_no: text_or(record, FieldKey::DoorNo, ""),
            street: text_or(record, FieldKey::StreetName, ""),
            landmark: text_or(record, FieldKey::Landmark, ""),
            area: text_or(record, FieldKey::Area, ""),
            city_id: int_or(record, FieldKey::CityId, 0),
            mandal_id: int_or(record, FieldKey::MandalId, 0),
            district_id: int_or(record, FieldKey::DistrictId, 0),
            pincode: int_or(record, FieldKey::Pincode, 0),
            state_id: int_or(record, FieldKey::StateId, 0),
            created_by,
        },
        stud_adms_no: context.application_no,
        pro_id: int_or(record, FieldKey::ProId, 1),
        created_by,
    }
}

/// Receipt lookup and text defaults differ between the sale and confirmation blocks.
struct PaymentDefaults {
    receipt_keys: &'static [FieldKey],
    text: &'static str,
}

impl PaymentDefaults {
    const SALE: PaymentDefaults = PaymentDefaults {
        receipt_keys: &[FieldKey::ReceiptNumber],
        text: "",
    };
    const CONFIRMATION: PaymentDefaults = PaymentDefaults {
        receipt_keys: &[FieldKey::ReceiptNumber, FieldKey::PrePrintedReceiptNo],
        text: PLACEHOLDER,
    };
}

fn payment_details(
    record: &CanonicalRecord,
    context: &SubmissionContext,
    defaults: PaymentDefaults,
) -> PaymentDetails {
    PaymentDetails {
        payment_mode_id: first_int(
            record,
            &[FieldKey::PaymentModeId, FieldKey::PayMode, FieldKey::PaymentMode],
            1,
        ),
        payment_date: timestamp_or_now(record, FieldKey::PaymentDate, context.now),
        amount: float_or(record, FieldKey::Amount, MINIMAL_AMOUNT),
        pre_printed_receipt_no: first_text(record, defaults.receipt_keys, defaults.text),
        remarks: text_or(record, FieldKey::Remarks, defaults.text),
        created_by: context.operator_id,
    }
}

fn confirmation(
    record: &CanonicalRecord,
    category: Category,
    context: &SubmissionContext,
) -> ConfirmationPayload {
    ConfirmationPayload {
        stud_adms_no: context.application_no,
        created_by: context.operator_id,
        app_conf_date: timestamp(context.now),
        food_type_id: int_or(record, FieldKey::FoodTypeId, 0),
        blood_group_id: int_or(record, FieldKey::BloodGroupId, 0),
        ht_no: text_or(record, FieldKey::HtNo, PLACEHOLDER),
        orientation_id: first_int(
            record,
            &[FieldKey::OrientationNameId, FieldKey::OrientationId],
            0,
        ),
        orientation_batch_id: optional_int(record, FieldKey::OrientationBatchId),
        orientation_date: timestamp_or_now(record, FieldKey::OrientationStartDate, context.now),
        school_state_id: optional_int(record, FieldKey::SchoolStateId),
        school_district_id: optional_int(record, FieldKey::SchoolDistrictId),
        school_type_id: optional_int(record, FieldKey::SchoolTypeId),
        school_name: text_or(record, FieldKey::SchoolName, PLACEHOLDER),
        score_app_no: text_or(record, FieldKey::ScoreAppNo, PLACEHOLDER),
        marks: float_or(record, FieldKey::Marks, 0.0),
        parents: parents(record, context.operator_id),
        siblings: siblings(record, context.operator_id),
        concessions: concessions(record, category, context.operator_id),
        payment_details: payment_details(record, context, PaymentDefaults::CONFIRMATION),
    }
}

fn parents(record: &CanonicalRecord, created_by: i64) -> Vec<ParentEntry> {
    let parent = |name, relation_type_id, occupation, phone, email| ParentEntry {
        name: text_or(record, name, PLACEHOLDER),
        relation_type_id,
        occupation: text_or(record, occupation, PLACEHOLDER),
        mobile_no: int_or(record, phone, 0),
        email: text_or(record, email, PLACEHOLDER),
        created_by,
    };

    [
        parent(
            FieldKey::FatherName,
            FATHER_RELATION,
            FieldKey::FatherOccupation,
            FieldKey::FatherPhoneNumber,
            FieldKey::FatherEmail,
        ),
        parent(
            FieldKey::MotherName,
            MOTHER_RELATION,
            FieldKey::MotherOccupation,
            FieldKey::MotherPhoneNumber,
            FieldKey::MotherEmail,
        ),
    ]
    .into_iter()
    .filter(|entry| entry.name != PLACEHOLDER)
    .collect()
}

fn siblings(record: &CanonicalRecord, created_by: i64) -> Vec<SiblingEntry> {
    let Some(FieldValue::Nested(Value::Array(entries))) = record.get(FieldKey::Siblings) else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| {
            let field = |name: &str| entry.get(name).cloned().and_then(FieldValue::from_json);
            SiblingEntry {
                full_name: value_text(field("fullName").as_ref(), PLACEHOLDER),
                school_name: value_text(field("schoolName").as_ref(), PLACEHOLDER),
                class_id: value_int(field("classId").as_ref()).unwrap_or(0),
                relation_type_id: value_int(field("relationTypeId").as_ref()).unwrap_or(0),
                gender_id: value_int(field("genderId").as_ref()).unwrap_or(0),
                created_by,
            }
        })
        .collect()
}

fn concessions(record: &CanonicalRecord, category: Category, created_by: i64) -> Vec<ConcessionEntry> {
    let names: &[FieldKey] = match category {
        Category::School => &[FieldKey::AdmissionFee, FieldKey::TuitionFee],
        Category::College | Category::Degree => &[
            FieldKey::YearConcession1st,
            FieldKey::YearConcession2nd,
            FieldKey::YearConcession3rd,
        ],
    };
    let type_ids = match record.get(FieldKey::ConcessionTypeIds) {
        Some(FieldValue::Nested(Value::Object(map))) => Some(map),
        _ => None,
    };

    names
        .iter()
        .filter(|name| record.is_present(**name))
        .map(|name| ConcessionEntry {
            concession_type_id: type_ids
                .and_then(|ids| ids.get(name.as_str()))
                .cloned()
                .and_then(FieldValue::from_json)
                .and_then(|value| value_int(Some(&value)))
                .unwrap_or(0),
            concession_amount: float_or(record, *name, MINIMAL_AMOUNT),
            given_by_id: int_or(record, FieldKey::GivenById, 0),
            authorized_by_id: int_or(record, FieldKey::AuthorizedById, 0),
            reason_id: int_or(record, FieldKey::ReasonId, 0),
            comments: text_or(record, FieldKey::Description, PLACEHOLDER),
            created_by,
        })
        .collect()
}
