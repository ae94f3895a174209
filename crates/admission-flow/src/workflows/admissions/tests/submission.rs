use serde_json::{json, Value};

use super::common::*;
use crate::workflows::admissions::domain::{Category, FieldKey, FragmentSource};
use crate::workflows::admissions::record::CanonicalRecord;
use crate::workflows::admissions::submission::{
    classify, Payload, SubmissionOutcome, SubmissionTransformer, SubmissionVariant,
    TransformError, TransportError, TransportResponse, SERIALIZATION_SUCCESS_MARKER,
};

fn build(record: &CanonicalRecord, variant: SubmissionVariant, category: Category) -> Value {
    SubmissionTransformer::build_with(record, variant, category, &context())
        .to_json()
        .expect("payload serializes")
}

fn response(status: u16, body: &str) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: body.to_string(),
    })
}

#[test]
fn complete_sale_carries_sale_fields_and_payment() {
    let body = build(&sale_record(), SubmissionVariant::CompleteSale, Category::College);

    assert_eq!(body["firstName"], json!("Ravi"));
    assert_eq!(body["lastName"], json!("Kumar"));
    assert_eq!(body["genderId"], json!(1));
    assert_eq!(body["aadharCardNo"], json!(123456789012_i64));
    assert_eq!(body["academicYearId"], json!(25));
    assert_eq!(body["branchId"], json!(14));
    assert_eq!(body["fatherMobileNo"], json!(9876543210_i64));
    assert_eq!(body["studAdmsNo"], json!(2_500_117));
    assert_eq!(body["createdBy"], json!(OPERATOR_ID));
    assert_eq!(body["appSaleDate"], json!("2025-06-01T09:30:00.000Z"));
    assert_eq!(body["dob"], json!("2012-04-15T00:00:00.000Z"));
    assert_eq!(body["addressDetails"]["doorNo"], json!("12-4/B"));
    assert_eq!(body["addressDetails"]["cityId"], json!(7));
    assert_eq!(body["addressDetails"]["pincode"], json!(500016));
    assert_eq!(body["paymentDetails"]["paymentModeId"], json!(2));
    assert_eq!(body["paymentDetails"]["amount"], json!(1500.0));
    assert_eq!(body["paymentDetails"]["prePrintedReceiptNo"], json!("R-100"));
    assert_eq!(body["paymentDetails"]["paymentDate"], json!("2025-06-01T00:00:00.000Z"));
}

#[test]
fn sale_only_has_no_payment_block() {
    let payload = SubmissionTransformer::build_with(
        &sale_record(),
        SubmissionVariant::SaleOnly,
        Category::College,
        &context(),
    );
    assert_eq!(payload.variant(), SubmissionVariant::SaleOnly);

    let body = payload.to_json().expect("payload serializes");
    assert!(body.get("paymentDetails").is_none());
    assert_eq!(body["firstName"], json!("Ravi"));
}

#[test]
fn missing_values_fall_back_to_backend_defaults() {
    let body = build(
        &CanonicalRecord::new(),
        SubmissionVariant::CompleteSale,
        Category::College,
    );

    assert_eq!(body["firstName"], json!(""));
    assert_eq!(body["genderId"], json!(0));
    assert_eq!(body["appTypeId"], json!(1));
    assert_eq!(body["proId"], json!(1));
    assert_eq!(body["academicYearId"], json!(0));
    assert_eq!(body["dob"], json!("2025-06-01T09:30:00.000Z"));
    assert_eq!(body["paymentDetails"]["paymentModeId"], json!(1));
    assert_eq!(body["paymentDetails"]["amount"], json!(0.1));
    assert_eq!(body["paymentDetails"]["prePrintedReceiptNo"], json!(""));
}

#[test]
fn confirmation_payload_lists_parents_and_nullable_ids() {
    let body = build(
        &complete_record(),
        SubmissionVariant::Confirmation,
        Category::College,
    );

    assert_eq!(body["studAdmsNo"], json!(2_500_117));
    assert_eq!(body["appConfDate"], json!("2025-06-01T09:30:00.000Z"));
    assert_eq!(body["bloodGroupId"], json!(5));
    assert_eq!(body["schoolName"], json!("Little Flower High School"));
    assert_eq!(body["schoolTypeId"], json!(4));
    assert_eq!(body["marks"], json!(450.0));
    assert_eq!(body["htNo"], json!("string"));

    let parents = body["parents"].as_array().expect("parents array");
    assert_eq!(parents.len(), 2);
    assert_eq!(parents[0]["name"], json!("Suresh Kumar"));
    assert_eq!(parents[0]["relationTypeId"], json!(1));
    assert_eq!(parents[0]["occupation"], json!("Engineer"));
    assert_eq!(parents[1]["name"], json!("Lakshmi"));
    assert_eq!(parents[1]["email"], json!("string"));

    let sparse = build(
        &sale_record(),
        SubmissionVariant::Confirmation,
        Category::College,
    );
    assert_eq!(sparse["schoolStateId"], Value::Null);
    assert_eq!(sparse["orientationBatchId"], Value::Null);
    assert_eq!(sparse["parents"].as_array().map(Vec::len), Some(1));
    assert_eq!(sparse["paymentDetails"]["remarks"], json!("Paid at counter"));
}

#[test]
fn parents_without_a_name_are_omitted() {
    let record = record_from(vec![fragment(
        FragmentSource::Family,
        json!({ "fatherPhoneNumber": "9876500000" }),
    )]);
    let body = build(&record, SubmissionVariant::Confirmation, Category::School);

    assert_eq!(body["parents"], json!([]));
    assert_eq!(body["paymentDetails"]["remarks"], json!("string"));
}

#[test]
fn siblings_are_read_from_the_nested_list() {
    let record = record_from(vec![fragment(
        FragmentSource::Siblings,
        json!({ "siblings": [
            { "fullName": "Anil Kumar", "schoolName": "ZPHS", "classId": "6", "relationTypeId": 3, "genderId": 1 },
            { "fullName": "" },
        ] }),
    )]);
    let body = build(&record, SubmissionVariant::Confirmation, Category::School);

    let siblings = body["siblings"].as_array().expect("siblings array");
    assert_eq!(siblings.len(), 2);
    assert_eq!(siblings[0]["fullName"], json!("Anil Kumar"));
    assert_eq!(siblings[0]["classId"], json!(6));
    assert_eq!(siblings[0]["createdBy"], json!(OPERATOR_ID));
    assert_eq!(siblings[1]["fullName"], json!("string"));
    assert_eq!(siblings[1]["classId"], json!(0));
}

#[test]
fn college_concessions_are_per_year() {
    let body = build(
        &complete_record(),
        SubmissionVariant::Confirmation,
        Category::College,
    );

    let concessions = body["concessions"].as_array().expect("concessions array");
    assert_eq!(concessions.len(), 2);
    assert_eq!(concessions[0]["concessionTypeId"], json!(21));
    assert_eq!(concessions[0]["concessionAmount"], json!(2000.0));
    assert_eq!(concessions[0]["givenById"], json!(11));
    assert_eq!(concessions[0]["comments"], json!("Topper discount"));
    assert_eq!(concessions[1]["concessionTypeId"], json!(22));
}

#[test]
fn school_concessions_use_admission_and_tuition_fees() {
    let record = record_from(vec![fragment(
        FragmentSource::Concession,
        json!({
            "admissionFee": "500",
            "yearConcession1st": "2000",
            "concessionTypeIds": { "admissionFee": 7 },
        }),
    )]);
    let body = build(&record, SubmissionVariant::Confirmation, Category::School);

    let concessions = body["concessions"].as_array().expect("concessions array");
    assert_eq!(concessions.len(), 1);
    assert_eq!(concessions[0]["concessionTypeId"], json!(7));
    assert_eq!(concessions[0]["concessionAmount"], json!(500.0));
}

#[test]
fn handoff_requires_name_year_and_door_number() {
    assert_eq!(SubmissionTransformer::precheck_handoff(&sale_record()), Ok(()));

    let record = record_from(vec![personal_fragment()]);
    let error = SubmissionTransformer::precheck_handoff(&record).expect_err("incomplete");
    assert_eq!(
        error,
        TransformError::IncompleteHandoff {
            missing: vec!["academicYear", "doorNo"],
        }
    );
    assert_eq!(
        error.to_string(),
        "Please complete all form sections before proceeding. Missing: academicYear, doorNo"
    );
}

#[test]
fn transformer_reads_operator_and_credential_from_the_provider() {
    let transformer = SubmissionTransformer::new(credentials());
    let context = transformer.context("2500117");

    assert_eq!(context.application_no, 2_500_117);
    assert_eq!(context.operator_id, OPERATOR_ID);
    assert_eq!(transformer.credential().as_deref(), Some(TOKEN));

    let payload = transformer.build(
        &sale_record(),
        SubmissionVariant::CompleteSale,
        Category::College,
        "2500117",
    );
    assert!(matches!(payload, Payload::CompleteSale(ref sale) if sale.sale.created_by == OPERATOR_ID));
}

#[test]
fn explicit_academic_year_id_wins_over_the_display_year() {
    let record = record_with(sale_fragments(), FieldKey::AcademicYearId, json!(26));
    let body = build(&record, SubmissionVariant::SaleOnly, Category::College);
    assert_eq!(body["academicYearId"], json!(26));
}

#[test]
fn success_status_is_persisted_with_the_parsed_body() {
    let outcome = classify(
        SubmissionVariant::CompleteSale,
        response(201, r#"{"id": 88}"#),
    );
    assert_eq!(
        outcome,
        SubmissionOutcome::Success {
            body: Some(json!({ "id": 88 })),
        }
    );
    assert!(outcome.is_persisted());
}

#[test]
fn serialization_marker_in_an_error_body_counts_as_saved() {
    let body = format!(
        "{{\"error\": \"Type definition error: [simple type, class org.hibernate.proxy.pojo.bytebuddy.{SERIALIZATION_SUCCESS_MARKER}]\"}}"
    );
    let outcome = classify(SubmissionVariant::Confirmation, response(500, &body));

    assert_eq!(outcome, SubmissionOutcome::SuccessViaShim);
    assert!(outcome.is_persisted());
}

#[test]
fn failures_prefer_the_backend_message() {
    let outcome = classify(
        SubmissionVariant::SaleOnly,
        response(400, r#"{"message": "Receipt already used"}"#),
    );
    assert_eq!(
        outcome,
        SubmissionOutcome::Failure {
            status: Some(400),
            message: "Receipt already used".to_string(),
        }
    );

    let outcome = classify(SubmissionVariant::SaleOnly, response(502, "<html>bad gateway</html>"));
    assert_eq!(
        outcome,
        SubmissionOutcome::Failure {
            status: Some(502),
            message: "HTTP error! status: 502".to_string(),
        }
    );
}

#[test]
fn transport_errors_become_failures_without_status() {
    let outcome = classify(
        SubmissionVariant::CompleteSale,
        Err(TransportError::Http("connection refused".to_string())),
    );
    assert_eq!(
        outcome,
        SubmissionOutcome::Failure {
            status: None,
            message: "request failed: connection refused".to_string(),
        }
    );
    assert!(!outcome.is_persisted());
}

#[test]
fn variants_map_to_their_backend_paths() {
    assert_eq!(
        SubmissionVariant::CompleteSale.path(),
        "/api/student-admissions-sale/create"
    );
    assert_eq!(
        SubmissionVariant::SaleOnly.path(),
        "/api/student-admissions-sale/create/sale/only"
    );
    assert_eq!(
        SubmissionVariant::Confirmation.path(),
        "/api/application-confirmation/confirm"
    );
    assert_eq!(SubmissionVariant::parse("sale-only"), Some(SubmissionVariant::SaleOnly));
    assert_eq!(SubmissionVariant::parse("refund"), None);
}
