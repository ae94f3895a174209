use serde::{Deserialize, Serialize};

/// Phase of the wizard; each phase carries its own required-field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Sale,
    Confirmation,
}

impl Step {
    pub const fn number(self) -> u8 {
        match self {
            Step::Sale => 1,
            Step::Confirmation => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Step::Sale => "sale",
            Step::Confirmation => "confirmation",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sale" | "1" | "step1" => Some(Step::Sale),
            "confirmation" | "2" | "step2" => Some(Step::Confirmation),
            _ => None,
        }
    }
}

/// Institution type; narrows which fields a step treats as mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    School,
    Degree,
    College,
}

impl Category {
    pub const fn label(self) -> &'static str {
        match self {
            Category::School => "SCHOOL",
            Category::Degree => "DEGREE",
            Category::College => "COLLEGE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SCHOOL" => Some(Category::School),
            "DEGREE" => Some(Category::Degree),
            "COLLEGE" => Some(Category::College),
            _ => None,
        }
    }

    /// First parsable candidate wins; sessions without any fall back to `COLLEGE`.
    pub fn resolve<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        candidates
            .into_iter()
            .flatten()
            .find_map(Category::parse)
            .unwrap_or(Category::College)
    }
}

/// Sub-form that produced a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentSource {
    Personal,
    Orientation,
    Address,
    Payment,
    StatusHeader,
    Family,
    Siblings,
    Academic,
    Concession,
}

impl FragmentSource {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "personal" => Some(Self::Personal),
            "orientation" => Some(Self::Orientation),
            "address" => Some(Self::Address),
            "payment" => Some(Self::Payment),
            "status_header" => Some(Self::StatusHeader),
            "family" => Some(Self::Family),
            "siblings" => Some(Self::Siblings),
            "academic" => Some(Self::Academic),
            "concession" => Some(Self::Concession),
            _ => None,
        }
    }

    /// Resolve a wire key in the context of this source.
    ///
    /// `city` is claimed by both the orientation and address sections, so it is
    /// only accepted from those two and lands on distinct keys.
    pub fn resolve_key(self, wire: &str) -> Option<FieldKey> {
        if wire == "city" {
            return match self {
                FragmentSource::Orientation => Some(FieldKey::OrientationCity),
                FragmentSource::Address => Some(FieldKey::AddressCity),
                _ => None,
            };
        }
        FieldKey::from_wire(wire)
    }
}

/// Partial field set emitted by one sub-form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub source: FragmentSource,
    pub values: serde_json::Map<String, serde_json::Value>,
}

impl Fragment {
    pub fn new(source: FragmentSource, values: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { source, values }
    }

    /// Build a fragment from a JSON object; anything else yields an empty fragment.
    pub fn from_json(source: FragmentSource, value: serde_json::Value) -> Self {
        let values = match value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self { source, values }
    }
}

macro_rules! field_keys {
    ($($variant:ident => $wire:literal, $label:literal;)+) => {
        /// Every field the wizard knows about, in form order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FieldKey {
            $($variant,)+
        }

        impl FieldKey {
            pub const ALL: &'static [FieldKey] = &[$(FieldKey::$variant,)+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(FieldKey::$variant => $wire,)+
                }
            }

            pub const fn label(self) -> &'static str {
                match self {
                    $(FieldKey::$variant => $label,)+
                }
            }

            pub fn from_wire(wire: &str) -> Option<Self> {
                match wire {
                    $($wire => Some(FieldKey::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

field_keys! {
    // personal
    FirstName => "firstName", "First Name";
    Surname => "surname", "Surname";
    Gender => "gender", "Gender";
    AaparNo => "aaparNo", "Aapar No";
    DateOfBirth => "dateOfBirth", "Date of Birth";
    AadharCardNo => "aadharCardNo", "Aadhar Card No";
    Quota => "quota", "Quota";
    QuotaLabel => "quotaLabel", "Quota";
    EmployeeId => "employeeId", "Employee ID";
    AdmissionType => "admissionType", "Admission Type";
    AdmissionTypeId => "admissionTypeId", "Admission Type";
    AdmissionReferredBy => "admissionReferredBy", "Admission Referred By";
    ProReceiptNo => "proReceiptNo", "PRO Receipt No";
    ProId => "proId", "PRO";
    PhoneNumber => "phoneNumber", "Phone Number";
    // orientation
    AcademicYear => "academicYear", "Academic Year";
    AcademicYearId => "academicYearId", "Academic Year";
    ApplicationFee => "applicationFee", "Application Fee";
    Branch => "branch", "Branch";
    BranchId => "branchId", "Branch";
    BranchType => "branchType", "Branch Type";
    OrientationCity => "orientationCity", "City";
    StudentType => "studentType", "Student Type";
    StudentTypeId => "studentTypeId", "Student Type";
    JoiningClass => "joiningClass", "Joining Class";
    JoiningClassId => "joiningClassId", "Joining Class";
    OrientationName => "orientationName", "Orientation Name";
    OrientationNameId => "orientationNameId", "Orientation Name";
    OrientationId => "orientationId", "Orientation";
    // address
    DoorNo => "doorNo", "Door No";
    StreetName => "streetName", "Street Name";
    Landmark => "landmark", "Landmark";
    Area => "area", "Area";
    Pincode => "pincode", "Pincode";
    State => "state", "State";
    StateId => "stateId", "State";
    District => "district", "District";
    DistrictId => "districtId", "District";
    Mandal => "mandal", "Mandal";
    MandalId => "mandalId", "Mandal";
    AddressCity => "addressCity", "Address City";
    CityId => "cityId", "City";
    // payment
    PaymentModeId => "paymentModeId", "Payment Mode";
    PayMode => "payMode", "Payment Mode";
    PaymentMode => "paymentMode", "Payment Mode";
    PaymentDate => "paymentDate", "Payment Date";
    Amount => "amount", "Amount";
    ReceiptNumber => "receiptNumber", "Receipt Number";
    PrePrintedReceiptNo => "prePrintedReceiptNo", "Receipt Number";
    Remarks => "remarks", "Remarks";
    // family
    FatherName => "fatherName", "Father Name";
    FatherPhoneNumber => "fatherPhoneNumber", "Father Phone Number";
    FatherEmail => "fatherEmail", "Father Email";
    FatherSector => "fatherSector", "Father Sector";
    FatherOccupation => "fatherOccupation", "Father Occupation";
    FatherOtherOccupation => "fatherOtherOccupation", "Father Other Occupation";
    MotherName => "motherName", "Mother Name";
    MotherPhoneNumber => "motherPhoneNumber", "Mother Phone Number";
    MotherEmail => "motherEmail", "Mother Email";
    MotherSector => "motherSector", "Mother Sector";
    MotherOccupation => "motherOccupation", "Mother Occupation";
    MotherOtherOccupation => "motherOtherOccupation", "Mother Other Occupation";
    Siblings => "siblings", "Siblings";
    // academic
    HtNo => "htNo", "Hall Ticket No";
    OrientationBatch => "orientationBatch", "Orientation Batch";
    OrientationBatchId => "orientationBatchId", "Orientation Batch";
    OrientationStartDate => "orientationStartDate", "Orientation Start Date";
    SchoolState => "schoolState", "School State";
    SchoolStateId => "schoolStateId", "School State";
    SchoolDistrict => "schoolDistrict", "School District";
    SchoolDistrictId => "schoolDistrictId", "School District";
    SchoolName => "schoolName", "School Name";
    SchoolType => "schoolType", "School Type";
    SchoolTypeId => "schoolTypeId", "School Type";
    ScoreAppNo => "scoreAppNo", "Score App No";
    ScoreMarks => "scoreMarks", "Marks";
    Marks => "marks", "Marks";
    BloodGroup => "bloodGroup", "Blood Group";
    BloodGroupId => "bloodGroupId", "Blood Group";
    Caste => "caste", "Caste";
    Religion => "religion", "Religion";
    FoodType => "foodType", "Food Type";
    FoodTypeId => "foodTypeId", "Food Type";
    // concession
    GivenBy => "givenBy", "Given By";
    GivenById => "givenById", "Given By";
    AuthorizedBy => "authorizedBy", "Authorized By";
    AuthorizedById => "authorizedById", "Authorized By";
    Reason => "reason", "Reason";
    ReasonId => "reasonId", "Reason";
    Description => "description", "Description";
    AdmissionFee => "admissionFee", "Admission Fee";
    TuitionFee => "tuitionFee", "Tuition Fee";
    YearConcession1st => "yearConcession1st", "1st Year Concession";
    YearConcession2nd => "yearConcession2nd", "2nd Year Concession";
    YearConcession3rd => "yearConcession3rd", "3rd Year Concession";
    ConcessionTypeIds => "concessionTypeIds", "Concession Types";
}

impl Serialize for FieldKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldKey::from_wire(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown field '{raw}'")))
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
