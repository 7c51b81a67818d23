use chrono::{DateTime, Utc};
use tracing::debug;

use super::domain::{
    whole_days, ApproveForm, CalculationRequest, LoanApplicationRecord, ProductTerms,
};
use crate::workflows::payload::LogicalField;

pub const DEFAULT_TERM_DAYS: u32 = 30;
pub const DEFAULT_INTEREST_RATE: f64 = 2.5;
const DAYS_PER_MONTH: u32 = 30;

/// Assembles calculator requests for one application. Pure: the disbursement
/// timestamp is supplied by the caller.
#[derive(Debug, Clone)]
pub struct CalculationRequestBuilder {
    terms: ProductTerms,
}

impl CalculationRequestBuilder {
    pub fn for_record(record: &LoanApplicationRecord) -> Self {
        let unmapped = record.unmapped_keys();
        if !unmapped.is_empty() {
            debug!(keys = ?unmapped, "application carries unmapped keys");
        }

        Self {
            terms: ProductTerms::resolve(record),
        }
    }

    pub fn terms(&self) -> &ProductTerms {
        &self.terms
    }

    /// Form values shown when the approval view first opens.
    pub fn prefill_form(&self, record: &LoanApplicationRecord) -> ApproveForm {
        let requested_amount = record
            .number(LogicalField::RequestedAmount)
            .unwrap_or(0.0)
            .max(0.0);

        let requested_term_days = whole_days(record.number(LogicalField::RequestedTermDays));
        let term_days = match (requested_term_days, self.terms.fixed_term_days) {
            (0, 0) => DEFAULT_TERM_DAYS,
            (0, fixed) => fixed,
            (requested, _) => requested,
        };

        let interest_rate = self
            .terms
            .interest_rate
            .filter(|rate| *rate > 0.0)
            .unwrap_or(DEFAULT_INTEREST_RATE);

        ApproveForm {
            approved_amount: requested_amount,
            approved_term_days: term_days,
            approved_interest_rate: interest_rate,
            interest_type: self.terms.interest_type,
            notes: String::new(),
        }
    }

    /// Builds the request for the form's current values. The interest type
    /// always follows the product; the collector cannot override it.
    pub fn build(&self, form: &ApproveForm, disbursement_date: DateTime<Utc>) -> CalculationRequest {
        let terms = &self.terms;
        CalculationRequest {
            loan_amount: form.approved_amount,
            term_days: form.approved_term_days,
            term_months: term_months(form.approved_term_days),
            payment_frequency: terms.payment_frequency,
            interest_rate: form.approved_interest_rate,
            interest_type: terms.interest_type,
            processing_fee_percentage: terms.processing_fee_percent.max(0.0),
            platform_fee: terms.platform_fee.max(0.0),
            late_penalty_percentage: 0.0,
            disbursement_date,
            deduct_platform_fee_in_advance: terms.deductions.platform_fee_in_advance,
            deduct_processing_fee_in_advance: terms.deductions.processing_fee_in_advance,
            deduct_interest_in_advance: terms.deductions.interest_in_advance,
        }
    }
}

/// Whole months covering `term_days`, never less than one.
pub fn term_months(term_days: u32) -> u32 {
    term_days.div_ceil(DAYS_PER_MONTH).max(1)
}

/// Prefill-then-build for callers that do not edit the form.
pub fn build_request(
    record: &LoanApplicationRecord,
    disbursement_date: DateTime<Utc>,
) -> (ApproveForm, CalculationRequest) {
    let builder = CalculationRequestBuilder::for_record(record);
    let form = builder.prefill_form(record);
    let request = builder.build(&form, disbursement_date);
    (form, request)
}
