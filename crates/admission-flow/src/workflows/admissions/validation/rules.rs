use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::super::domain::{Category, FieldKey, Step};
use super::super::record::CanonicalRecord;

/// Text formats referenced by field rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Letters,
    AadharDigits,
    IndianMobile,
    TenDigits,
    Pincode,
    Email,
}

impl Format {
    fn regex(self) -> &'static Regex {
        static LETTERS: OnceLock<Regex> = OnceLock::new();
        static AADHAR: OnceLock<Regex> = OnceLock::new();
        static MOBILE: OnceLock<Regex> = OnceLock::new();
        static TEN_DIGITS: OnceLock<Regex> = OnceLock::new();
        static PINCODE: OnceLock<Regex> = OnceLock::new();
        static EMAIL: OnceLock<Regex> = OnceLock::new();

        // Digit classes are spelled `[0-9]`; the regex crate's `\d` also matches non-ASCII digits.
        let (cell, pattern) = match self {
            Format::Letters => (&LETTERS, r"^[A-Za-z\s]+$"),
            Format::AadharDigits => (&AADHAR, r"^[0-9]{12}$"),
            Format::IndianMobile => (&MOBILE, r"^[6-9][0-9]{9}$"),
            Format::TenDigits => (&TEN_DIGITS, r"^[0-9]{10}$"),
            Format::Pincode => (&PINCODE, r"^[0-9]{6}$"),
            Format::Email => (&EMAIL, r"^[^\s@]+@[^\s@]+\.[^\s@]+$"),
        };
        cell.get_or_init(|| Regex::new(pattern).expect("static field pattern compiles"))
    }

    pub fn matches(self, value: &str) -> bool {
        self.regex().is_match(value)
    }
}

/// A single rule applied after the required check passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    MinLen(usize, &'static str),
    MaxLen(usize, &'static str),
    Matches(Format, &'static str),
    /// Parsable, not after today, and at least `min_age_years` calendar years old.
    BirthDate {
        future: &'static str,
        min_age_years: i32,
        too_young: &'static str,
    },
}

/// Declared rules for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub key: FieldKey,
    pub required: Option<&'static str>,
    pub checks: &'static [Check],
}

impl FieldRule {
    const fn required(key: FieldKey, message: &'static str) -> Self {
        Self {
            key,
            required: Some(message),
            checks: &[],
        }
    }

    const fn checked(key: FieldKey, message: &'static str, checks: &'static [Check]) -> Self {
        Self {
            key,
            required: Some(message),
            checks,
        }
    }

    const fn optional(key: FieldKey, checks: &'static [Check]) -> Self {
        Self {
            key,
            required: None,
            checks,
        }
    }

    /// First violated message, if any. Empty optional fields always pass.
    pub fn evaluate(&self, record: &CanonicalRecord, today: NaiveDate) -> Option<&'static str> {
        let text = record.text(self.key);
        let text = text.trim();
        if text.is_empty() {
            return self.required;
        }

        self.checks.iter().find_map(|check| match *check {
            Check::MinLen(min, message) => (text.chars().count() < min).then_some(message),
            Check::MaxLen(max, message) => (text.chars().count() > max).then_some(message),
            Check::Matches(format, message) => (!format.matches(text)).then_some(message),
            Check::BirthDate {
                future,
                min_age_years,
                too_young,
            } => match record.get(self.key).and_then(|value| value.as_date()) {
                None => Some(too_young),
                Some(born) if born > today => Some(future),
                Some(born) if today.year() - born.year() < min_age_years => Some(too_young),
                Some(_) => None,
            },
        })
    }
}

/// Rule set chosen by step and category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRuleSet {
    Sale,
    Confirmation { school_provenance: bool },
}

impl FieldRuleSet {
    pub fn select(step: Step, category: Category) -> Self {
        match step {
            Step::Sale => FieldRuleSet::Sale,
            Step::Confirmation => FieldRuleSet::Confirmation {
                school_provenance: category == Category::College,
            },
        }
    }

    pub fn rules(self) -> impl Iterator<Item = &'static FieldRule> {
        let (base, extension): (&'static [FieldRule], &'static [FieldRule]) = match self {
            FieldRuleSet::Sale => (SALE_RULES, &[]),
            FieldRuleSet::Confirmation { school_provenance } => (
                CONFIRMATION_RULES,
                if school_provenance {
                    SCHOOL_PROVENANCE_RULES
                } else {
                    &[]
                },
            ),
        };
        base.iter().chain(extension.iter())
    }

    pub fn covers(self, key: FieldKey) -> bool {
        self.rules().any(|rule| rule.key == key)
    }
}

const FIRST_NAME_CHECKS: &[Check] = &[
    Check::MinLen(2, "First Name must be at least 2 characters"),
    Check::MaxLen(50, "First Name must be less than 50 characters"),
    Check::Matches(Format::Letters, "First Name must contain only letters"),
];
const SURNAME_CHECKS: &[Check] = &[
    Check::MinLen(2, "Surname must be at least 2 characters"),
    Check::MaxLen(50, "Surname must be less than 50 characters"),
    Check::Matches(Format::Letters, "Surname must contain only letters"),
];
const DATE_OF_BIRTH_CHECKS: &[Check] = &[Check::BirthDate {
    future: "Date of Birth cannot be in the future",
    min_age_years: 5,
    too_young: "Age must be at least 5 years",
}];
const AADHAR_CHECKS: &[Check] = &[Check::Matches(
    Format::AadharDigits,
    "Aadhar Card No must be exactly 12 digits",
)];
const PHONE_CHECKS: &[Check] = &[Check::Matches(
    Format::IndianMobile,
    "Phone Number must be exactly 10 digits starting with 6, 7, 8, or 9",
)];
const PINCODE_CHECKS: &[Check] = &[Check::Matches(
    Format::Pincode,
    "Pincode must be exactly 6 digits",
)];

const SALE_RULES: &[FieldRule] = &[
    FieldRule::checked(FieldKey::FirstName, "First Name is required", FIRST_NAME_CHECKS),
    FieldRule::checked(FieldKey::Surname, "Surname is required", SURNAME_CHECKS),
    FieldRule::required(FieldKey::Gender, "Gender is required"),
    FieldRule::required(FieldKey::AaparNo, "Aapar No is required"),
    FieldRule::checked(
        FieldKey::DateOfBirth,
        "Date of Birth is required",
        DATE_OF_BIRTH_CHECKS,
    ),
    FieldRule::checked(
        FieldKey::AadharCardNo,
        "Aadhar Card No is required",
        AADHAR_CHECKS,
    ),
    FieldRule::required(FieldKey::Quota, "Quota is required"),
    FieldRule::checked(FieldKey::PhoneNumber, "Phone Number is required", PHONE_CHECKS),
    FieldRule::required(FieldKey::DoorNo, "Door No is required"),
    FieldRule::required(FieldKey::StreetName, "Street Name is required"),
    FieldRule::required(FieldKey::Area, "Area is required"),
    FieldRule::checked(FieldKey::Pincode, "Pincode is required", PINCODE_CHECKS),
    FieldRule::required(FieldKey::Mandal, "Mandal is required"),
];

const FATHER_NAME_CHECKS: &[Check] = &[
    Check::MinLen(2, "Father Name must be at least 2 characters"),
    Check::MaxLen(50, "Father Name must be less than 50 characters"),
    Check::Matches(Format::Letters, "Father Name must contain only letters"),
];
const FATHER_PHONE_CHECKS: &[Check] = &[Check::Matches(
    Format::TenDigits,
    "Father phone number must be exactly 10 digits",
)];
const MOTHER_NAME_CHECKS: &[Check] = &[
    Check::MinLen(2, "Mother Name must be at least 2 characters"),
    Check::MaxLen(50, "Mother Name must be less than 50 characters"),
    Check::Matches(Format::Letters, "Mother Name must contain only letters"),
];
const MOTHER_PHONE_CHECKS: &[Check] = &[Check::Matches(
    Format::TenDigits,
    "Mother phone number must be exactly 10 digits",
)];
const EMAIL_CHECKS: &[Check] = &[
    Check::Matches(Format::Email, "Please enter a valid email address"),
    Check::MaxLen(100, "Email must not exceed 100 characters"),
];
const SECTOR_CHECKS: &[Check] = &[Check::MaxLen(100, "Sector must not exceed 100 characters")];
const OCCUPATION_CHECKS: &[Check] =
    &[Check::MaxLen(100, "Occupation must not exceed 100 characters")];
const OTHER_OCCUPATION_CHECKS: &[Check] = &[Check::MaxLen(
    100,
    "Other occupation must not exceed 100 characters",
)];

const CONFIRMATION_RULES: &[FieldRule] = &[
    FieldRule::checked(FieldKey::FatherName, "Father Name is required", FATHER_NAME_CHECKS),
    FieldRule::checked(
        FieldKey::FatherPhoneNumber,
        "Father phone number is required",
        FATHER_PHONE_CHECKS,
    ),
    FieldRule::optional(FieldKey::FatherEmail, EMAIL_CHECKS),
    FieldRule::optional(FieldKey::FatherSector, SECTOR_CHECKS),
    FieldRule::optional(FieldKey::FatherOccupation, OCCUPATION_CHECKS),
    FieldRule::optional(FieldKey::FatherOtherOccupation, OTHER_OCCUPATION_CHECKS),
    FieldRule::checked(FieldKey::MotherName, "Mother Name is required", MOTHER_NAME_CHECKS),
    FieldRule::checked(
        FieldKey::MotherPhoneNumber,
        "Mother phone number is required",
        MOTHER_PHONE_CHECKS,
    ),
    FieldRule::optional(FieldKey::MotherEmail, EMAIL_CHECKS),
    FieldRule::optional(FieldKey::MotherSector, SECTOR_CHECKS),
    FieldRule::optional(FieldKey::MotherOccupation, OCCUPATION_CHECKS),
    FieldRule::optional(FieldKey::MotherOtherOccupation, OTHER_OCCUPATION_CHECKS),
    FieldRule::required(FieldKey::ScoreMarks, "Marks are required"),
    FieldRule::required(FieldKey::BloodGroup, "Blood Group is required"),
    FieldRule::required(FieldKey::Caste, "Caste is required"),
    FieldRule::required(FieldKey::Religion, "Religion is required"),
    FieldRule::required(FieldKey::FoodType, "Food Type is required"),
    FieldRule::required(FieldKey::GivenBy, "Given By is required"),
    FieldRule::required(FieldKey::AuthorizedBy, "Authorized By is required"),
    FieldRule::required(FieldKey::Reason, "Reason is required"),
];

const SCHOOL_NAME_CHECKS: &[Check] = &[
    Check::MinLen(2, "School Name must be at least 2 characters"),
    Check::MaxLen(100, "School Name must be less than 100 characters"),
];

const SCHOOL_PROVENANCE_RULES: &[FieldRule] = &[
    FieldRule::required(FieldKey::OrientationBatch, "Orientation Batch is required"),
    FieldRule::required(FieldKey::SchoolState, "School State is required"),
    FieldRule::required(FieldKey::SchoolDistrict, "School District is required"),
    FieldRule::checked(FieldKey::SchoolName, "School Name is required", SCHOOL_NAME_CHECKS),
    FieldRule::required(FieldKey::SchoolType, "School Type is required"),
];
