use serde::{Deserialize, Serialize};
use std::fmt;

/// Repayment cadence understood by the remote calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl PaymentFrequency {
    pub const fn ordered() -> [Self; 4] {
        [Self::Daily, Self::Weekly, Self::Biweekly, Self::Monthly]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestType {
    #[default]
    Flat,
    Reducing,
    Compound,
}

impl InterestType {
    pub const fn ordered() -> [Self; 3] {
        [Self::Flat, Self::Reducing, Self::Compound]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Reducing => "reducing",
            Self::Compound => "compound",
        }
    }
}

impl fmt::Display for InterestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a loan application as reported by the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Maps legacy and free-form cadence labels onto the calculator's variants.
/// Anything unrecognized, including a missing value, falls back to daily.
pub fn normalize_frequency(raw: Option<&str>) -> PaymentFrequency {
    match snake_case_words(raw.unwrap_or_default()).as_str() {
        "weekly" => PaymentFrequency::Weekly,
        "biweekly" | "bi-weekly" | "semi_monthly" | "semi-monthly" => PaymentFrequency::Biweekly,
        "monthly" => PaymentFrequency::Monthly,
        _ => PaymentFrequency::Daily,
    }
}

/// Only exact (case-insensitive) `reducing`/`compound` escape the flat default.
pub fn normalize_interest_type(raw: Option<&str>) -> InterestType {
    let lowered = raw.unwrap_or_default().to_lowercase();
    match lowered.as_str() {
        "reducing" => InterestType::Reducing,
        "compound" => InterestType::Compound,
        _ => InterestType::Flat,
    }
}

/// Unknown statuses stay unknown rather than defaulting.
pub fn normalize_application_status(raw: Option<&str>) -> Option<ApplicationStatus> {
    match snake_case_words(raw?.trim()).as_str() {
        "submitted" => Some(ApplicationStatus::Submitted),
        "under_review" | "under-review" => Some(ApplicationStatus::UnderReview),
        "approved" => Some(ApplicationStatus::Approved),
        "rejected" => Some(ApplicationStatus::Rejected),
        _ => None,
    }
}

/// Lower-cases and collapses each whitespace run into a single `_`.
fn snake_case_words(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut in_whitespace = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                output.push('_');
            }
            in_whitespace = true;
        } else {
            output.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }
    output
}
