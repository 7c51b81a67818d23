use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflows::payload::{
    field_bool, field_identifier, field_number, field_string, lenient, logical_field_for_key,
    normalize_application_status, normalize_frequency, normalize_interest_type,
    ApplicationStatus, InterestType, LogicalField, PaymentFrequency,
};

/// Read-only view over an application row as the API returned it. Every
/// attribute may be missing or spelled differently, so access goes through
/// the logical field table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanApplicationRecord(Map<String, Value>);

impl LoanApplicationRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Non-object payloads produce an empty record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn number(&self, field: LogicalField) -> Option<f64> {
        field_number(&self.0, field)
    }

    pub fn text(&self, field: LogicalField) -> Option<String> {
        field_string(&self.0, field)
    }

    pub fn flag(&self, field: LogicalField) -> Option<bool> {
        field_bool(&self.0, field)
    }

    pub fn id(&self) -> Option<String> {
        field_identifier(&self.0, LogicalField::ApplicationId)
    }

    pub fn application_number(&self) -> Option<String> {
        field_identifier(&self.0, LogicalField::ApplicationNumber)
    }

    pub fn status(&self) -> Option<ApplicationStatus> {
        normalize_application_status(self.text(LogicalField::Status).as_deref())
    }

    /// Full name from the joined first/last columns, the nested customer
    /// object, or the flat legacy name, in that order.
    pub fn customer_name(&self) -> Option<String> {
        let first = self.text(LogicalField::CustomerFirstName);
        let last = self.text(LogicalField::CustomerLastName);
        if let (Some(first), Some(last)) = (first, last) {
            return Some(format!("{} {}", first.trim(), last.trim()));
        }
        self.text(LogicalField::CustomerName)
    }

    pub fn product_name(&self) -> Option<String> {
        self.text(LogicalField::ProductName)
    }

    /// Top-level keys no logical field claims; a non-empty list after a
    /// backend release usually means a new spelling needs mapping.
    pub fn unmapped_keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|key| logical_field_for_key(key).is_none())
            .collect()
    }
}

/// Product-level terms carried on the application row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductTerms {
    pub fixed_term_days: u32,
    pub interest_rate: Option<f64>,
    pub processing_fee_percent: f64,
    pub platform_fee: f64,
    pub payment_frequency: PaymentFrequency,
    pub interest_type: InterestType,
    pub deductions: DeductionFlags,
}

impl ProductTerms {
    pub fn resolve(record: &LoanApplicationRecord) -> Self {
        Self {
            fixed_term_days: whole_days(record.number(LogicalField::ProductFixedTermDays)),
            interest_rate: record.number(LogicalField::InterestRate),
            processing_fee_percent: record
                .number(LogicalField::ProcessingFeePercent)
                .unwrap_or(0.0),
            platform_fee: record.number(LogicalField::PlatformFee).unwrap_or(0.0),
            payment_frequency: normalize_frequency(
                record.text(LogicalField::PaymentFrequency).as_deref(),
            ),
            interest_type: normalize_interest_type(
                record.text(LogicalField::InterestType).as_deref(),
            ),
            deductions: DeductionFlags::resolve(record),
        }
    }
}

/// Whether each fee comes out of the disbursed proceeds now or is added to
/// the repayment schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionFlags {
    pub interest_in_advance: bool,
    pub processing_fee_in_advance: bool,
    pub platform_fee_in_advance: bool,
}

impl DeductionFlags {
    pub fn resolve(record: &LoanApplicationRecord) -> Self {
        Self {
            interest_in_advance: record
                .flag(LogicalField::DeductInterestInAdvance)
                .unwrap_or(false),
            processing_fee_in_advance: record
                .flag(LogicalField::DeductProcessingFeeInAdvance)
                .unwrap_or(false),
            platform_fee_in_advance: record
                .flag(LogicalField::DeductPlatformFeeInAdvance)
                .unwrap_or(false),
        }
    }
}

/// Collector-editable approval values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveForm {
    pub approved_amount: f64,
    pub approved_term_days: u32,
    pub approved_interest_rate: f64,
    pub interest_type: InterestType,
    #[serde(default)]
    pub notes: String,
}

impl ApproveForm {
    pub fn is_valid(&self) -> bool {
        self.approved_amount > 0.0
            && self.approved_term_days > 0
            && self.approved_interest_rate > 0.0
    }

    pub fn apply(&mut self, overrides: &FormOverrides) {
        if let Some(amount) = overrides.approved_amount {
            self.approved_amount = amount;
        }
        if let Some(days) = overrides.approved_term_days {
            self.approved_term_days = days;
        }
        if let Some(rate) = overrides.approved_interest_rate {
            self.approved_interest_rate = rate;
        }
        if let Some(notes) = &overrides.notes {
            self.notes = notes.clone();
        }
    }
}

/// Collector edits layered over the prefilled form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormOverrides {
    #[serde(alias = "approved_amount")]
    pub approved_amount: Option<f64>,
    #[serde(alias = "approved_term_days")]
    pub approved_term_days: Option<u32>,
    #[serde(alias = "approved_interest_rate")]
    pub approved_interest_rate: Option<f64>,
    pub notes: Option<String>,
}

/// Body sent to the remote calculator. Built once per debounced edit and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub loan_amount: f64,
    /// Kept for the validity precondition; the calculator only takes months.
    #[serde(skip)]
    pub term_days: u32,
    pub term_months: u32,
    pub payment_frequency: PaymentFrequency,
    pub interest_rate: f64,
    pub interest_type: InterestType,
    pub processing_fee_percentage: f64,
    pub platform_fee: f64,
    pub late_penalty_percentage: f64,
    pub disbursement_date: DateTime<Utc>,
    pub deduct_platform_fee_in_advance: bool,
    pub deduct_processing_fee_in_advance: bool,
    pub deduct_interest_in_advance: bool,
}

impl CalculationRequest {
    pub fn is_valid(&self) -> bool {
        self.loan_amount > 0.0 && self.term_days > 0 && self.interest_rate > 0.0
    }
}

/// Figures returned by the remote calculator. Displayed and forwarded, never
/// recomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalculationResult {
    #[serde(alias = "loan_amount", deserialize_with = "lenient::amount")]
    pub loan_amount: f64,
    #[serde(alias = "term_months", deserialize_with = "lenient::count")]
    pub term_months: u32,
    #[serde(alias = "payment_frequency")]
    pub payment_frequency: Option<String>,
    #[serde(alias = "interest_amount", deserialize_with = "lenient::amount")]
    pub interest_amount: f64,
    #[serde(alias = "processing_fee_amount", deserialize_with = "lenient::amount")]
    pub processing_fee_amount: f64,
    #[serde(alias = "platform_fee", deserialize_with = "lenient::amount")]
    pub platform_fee: f64,
    #[serde(alias = "net_proceeds", deserialize_with = "lenient::amount")]
    pub net_proceeds: f64,
    #[serde(alias = "total_repayable", deserialize_with = "lenient::amount")]
    pub total_repayable: f64,
    #[serde(alias = "num_payments", deserialize_with = "lenient::count")]
    pub num_payments: u32,
    #[serde(alias = "installment_amount", deserialize_with = "lenient::amount")]
    pub installment_amount: f64,
    #[serde(
        alias = "effective_interest_rate",
        deserialize_with = "lenient::optional_amount"
    )]
    pub effective_interest_rate: Option<f64>,
    #[serde(alias = "grace_period_days", deserialize_with = "lenient::optional_amount")]
    pub grace_period_days: Option<f64>,
    #[serde(alias = "total_deductions", deserialize_with = "lenient::optional_amount")]
    pub total_deductions: Option<f64>,
    #[serde(alias = "monthly_equivalent", deserialize_with = "lenient::optional_amount")]
    pub monthly_equivalent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulePreviewItem {
    #[serde(alias = "payment_number", deserialize_with = "lenient::count")]
    pub payment_number: u32,
    #[serde(alias = "due_date")]
    pub due_date: Option<String>,
    #[serde(alias = "installment_amount", deserialize_with = "lenient::amount")]
    pub installment_amount: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub principal: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub interest: f64,
    #[serde(alias = "remaining_balance", deserialize_with = "lenient::amount")]
    pub remaining_balance: f64,
    #[serde(alias = "cumulative_paid", deserialize_with = "lenient::amount")]
    pub cumulative_paid: f64,
}

/// Calculation plus the installment schedule when the endpoint includes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationPreview {
    pub calculation: CalculationResult,
    #[serde(default)]
    pub schedule: Vec<SchedulePreviewItem>,
}

/// Any positive fraction of a day counts as a full day.
pub(crate) fn whole_days(value: Option<f64>) -> u32 {
    value
        .filter(|days| *days > 0.0)
        .map(|days| days.ceil().min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> LoanApplicationRecord {
        LoanApplicationRecord::from_value(value)
    }

    #[test]
    fn customer_name_falls_back_through_shapes() {
        let joined = record(json!({ "customerFirstName": "Ana", "customerLastName": "Cruz" }));
        assert_eq!(joined.customer_name().as_deref(), Some("Ana Cruz"));

        let nested = record(json!({
            "customerFirstName": "Ana",
            "Customer": { "firstName": "Bea", "lastName": "Reyes" }
        }));
        assert_eq!(nested.customer_name().as_deref(), Some("Ana Reyes"));

        let flat = record(json!({ "customerName": "Carlo Dizon" }));
        assert_eq!(flat.customer_name().as_deref(), Some("Carlo Dizon"));

        assert_eq!(record(json!({})).customer_name(), None);
    }

    #[test]
    fn product_terms_default_missing_values() {
        let terms = ProductTerms::resolve(&record(json!({
            "product_payment_frequency": "Semi Monthly",
            "deduct_interest_in_advance": true,
        })));

        assert_eq!(terms.payment_frequency, PaymentFrequency::Biweekly);
        assert_eq!(terms.interest_type, InterestType::Flat);
        assert_eq!(terms.processing_fee_percent, 0.0);
        assert_eq!(terms.platform_fee, 0.0);
        assert_eq!(terms.fixed_term_days, 0);
        assert!(terms.deductions.interest_in_advance);
        assert!(!terms.deductions.platform_fee_in_advance);
    }

    #[test]
    fn unmapped_keys_flag_new_spellings() {
        let row = record(json!({ "requestedAmount": 5000, "requestedPrincipal": 5000 }));
        assert_eq!(row.unmapped_keys(), vec!["requestedPrincipal"]);
    }

    #[test]
    fn request_serializes_camel_case_without_term_days() {
        let request = CalculationRequest {
            loan_amount: 10_000.0,
            term_days: 30,
            term_months: 1,
            payment_frequency: PaymentFrequency::Weekly,
            interest_rate: 10.0,
            interest_type: InterestType::Flat,
            processing_fee_percentage: 3.0,
            platform_fee: 100.0,
            late_penalty_percentage: 0.0,
            disbursement_date: DateTime::parse_from_rfc3339("2025-10-01T08:00:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
            deduct_platform_fee_in_advance: true,
            deduct_processing_fee_in_advance: true,
            deduct_interest_in_advance: true,
        };

        let body = serde_json::to_value(&request).expect("serializes");
        assert_eq!(body["loanAmount"], json!(10_000.0));
        assert_eq!(body["termMonths"], json!(1));
        assert_eq!(body["paymentFrequency"], json!("weekly"));
        assert_eq!(body["processingFeePercentage"], json!(3.0));
        assert_eq!(body["latePenaltyPercentage"], json!(0.0));
        assert!(body.get("termDays").is_none());
    }

    #[test]
    fn result_accepts_snake_case_fields() {
        let result: CalculationResult = serde_json::from_value(json!({
            "interest_amount": 1000,
            "netProceeds": "8600.00",
            "num_payments": 4,
        }))
        .expect("tolerant decode");
        assert_eq!(result.interest_amount, 1000.0);
        assert_eq!(result.net_proceeds, 8600.0);
        assert_eq!(result.num_payments, 4);
        assert_eq!(result.total_repayable, 0.0);
    }
}
