use serde::Serialize;

/// Fields shared by the complete-sale and sale-only calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCore {
    pub first_name: String,
    pub last_name: String,
    pub gender_id: i64,
    pub apaar_no: String,
    pub dob: String,
    pub aadhar_card_no: i64,
    pub quota_id: i64,
    pub pro_receipt_no: i64,
    pub admission_type_id: i64,
    pub admission_refered_by: String,
    pub app_sale_date: String,
    pub father_name: String,
    pub father_mobile_no: i64,
    pub academic_year_id: i64,
    pub branch_id: i64,
    pub student_type_id: i64,
    pub class_id: i64,
    pub orientation_id: i64,
    pub app_type_id: i64,
    pub address_details: AddressDetails,
    pub stud_adms_no: i64,
    pub pro_id: i64,
    pub created_by: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDetails {
    pub door_no: String,
    pub street: String,
    pub landmark: String,
    pub area: String,
    pub city_id: i64,
    pub mandal_id: i64,
    pub district_id: i64,
    pub pincode: i64,
    pub state_id: i64,
    pub created_by: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub payment_mode_id: i64,
    pub payment_date: String,
    pub amount: f64,
    pub pre_printed_receipt_no: String,
    pub remarks: String,
    pub created_by: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSalePayload {
    #[serde(flatten)]
    pub sale: SaleCore,
    pub payment_details: PaymentDetails,
}

/// Sale without any payment block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SaleOnlyPayload {
    pub sale: SaleCore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentEntry {
    pub name: String,
    pub relation_type_id: i64,
    pub occupation: String,
    pub mobile_no: i64,
    pub email: String,
    pub created_by: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingEntry {
    pub full_name: String,
    pub school_name: String,
    pub class_id: i64,
    pub relation_type_id: i64,
    pub gender_id: i64,
    pub created_by: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcessionEntry {
    pub concession_type_id: i64,
    pub concession_amount: f64,
    pub given_by_id: i64,
    pub authorized_by_id: i64,
    pub reason_id: i64,
    pub comments: String,
    pub created_by: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPayload {
    pub stud_adms_no: i64,
    pub created_by: i64,
    pub app_conf_date: String,
    pub food_type_id: i64,
    pub blood_group_id: i64,
    pub ht_no: String,
    pub orientation_id: i64,
    pub orientation_batch_id: Option<i64>,
    pub orientation_date: String,
    pub school_state_id: Option<i64>,
    pub school_district_id: Option<i64>,
    pub school_type_id: Option<i64>,
    pub school_name: String,
    pub score_app_no: String,
    pub marks: f64,
    pub parents: Vec<ParentEntry>,
    pub siblings: Vec<SiblingEntry>,
    pub concessions: Vec<ConcessionEntry>,
    pub payment_details: PaymentDetails,
}

/// A body ready for one of the three backend calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    CompleteSale(CompleteSalePayload),
    SaleOnly(SaleOnlyPayload),
    Confirmation(ConfirmationPayload),
}

impl Payload {
    pub fn variant(&self) -> super::SubmissionVariant {
        match self {
            Payload::CompleteSale(_) => super::SubmissionVariant::CompleteSale,
            Payload::SaleOnly(_) => super::SubmissionVariant::SaleOnly,
            Payload::Confirmation(_) => super::SubmissionVariant::Confirmation,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
