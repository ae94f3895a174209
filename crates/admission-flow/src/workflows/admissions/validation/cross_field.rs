use super::super::domain::FieldKey;
use super::super::record::CanonicalRecord;

/// Quota label that makes the employee id mandatory.
pub const STAFF_QUOTA_LABEL: &str = "Staff children";

pub const PRO_RECEIPT_MESSAGE: &str =
    "PRO Receipt No is required when admission type includes 'pro'";
pub const EMPLOYEE_ID_MESSAGE: &str =
    "Employee ID is required when Staff children quota is selected";

/// Rules whose requiredness depends on another field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossFieldRule {
    ProReceipt,
    StaffQuota,
}

impl CrossFieldRule {
    pub const ALL: [CrossFieldRule; 2] = [CrossFieldRule::StaffQuota, CrossFieldRule::ProReceipt];

    pub fn target(self) -> FieldKey {
        match self {
            CrossFieldRule::ProReceipt => FieldKey::ProReceiptNo,
            CrossFieldRule::StaffQuota => FieldKey::EmployeeId,
        }
    }

    pub fn evaluate(self, record: &CanonicalRecord, waive_pro_receipt: bool) -> Option<&'static str> {
        let triggered = match self {
            CrossFieldRule::ProReceipt => {
                !waive_pro_receipt
                    && record
                        .text(FieldKey::AdmissionType)
                        .to_lowercase()
                        .contains("pro")
            }
            // Exact label match; a label that merely contains the sentinel does not trigger.
            CrossFieldRule::StaffQuota => quota_label(record).trim() == STAFF_QUOTA_LABEL,
        };

        (triggered && !record.is_present(self.target())).then_some(self.message())
    }

    pub fn message(self) -> &'static str {
        match self {
            CrossFieldRule::ProReceipt => PRO_RECEIPT_MESSAGE,
            CrossFieldRule::StaffQuota => EMPLOYEE_ID_MESSAGE,
        }
    }
}

fn quota_label(record: &CanonicalRecord) -> std::borrow::Cow<'_, str> {
    if record.is_present(FieldKey::QuotaLabel) {
        record.text(FieldKey::QuotaLabel)
    } else {
        record.text(FieldKey::Quota)
    }
}
