use std::collections::HashMap;
use std::sync::OnceLock;

/// Logical attributes of a loan application record. Each maps to the ordered
/// list of keys the backend has used for it over time; this table is the one
/// place a new spelling gets added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    ApplicationId,
    ApplicationNumber,
    Status,
    CustomerId,
    CustomerFirstName,
    CustomerLastName,
    CustomerName,
    ProductName,
    RequestedAmount,
    RequestedTermDays,
    ProductFixedTermDays,
    InterestRate,
    ProcessingFeePercent,
    PlatformFee,
    PaymentFrequency,
    InterestType,
    DeductInterestInAdvance,
    DeductProcessingFeeInAdvance,
    DeductPlatformFeeInAdvance,
    CollectorId,
}

impl LogicalField {
    pub const fn all() -> [Self; 20] {
        [
            Self::ApplicationId,
            Self::ApplicationNumber,
            Self::Status,
            Self::CustomerId,
            Self::CustomerFirstName,
            Self::CustomerLastName,
            Self::CustomerName,
            Self::ProductName,
            Self::RequestedAmount,
            Self::RequestedTermDays,
            Self::ProductFixedTermDays,
            Self::InterestRate,
            Self::ProcessingFeePercent,
            Self::PlatformFee,
            Self::PaymentFrequency,
            Self::InterestType,
            Self::DeductInterestInAdvance,
            Self::DeductProcessingFeeInAdvance,
            Self::DeductPlatformFeeInAdvance,
            Self::CollectorId,
        ]
    }

    pub const fn candidate_keys(self) -> &'static [&'static str] {
        match self {
            Self::ApplicationId => &["id", "applicationId", "application_id"],
            Self::ApplicationNumber => &["applicationNumber", "application_number"],
            Self::Status => &["status", "applicationStatus", "application_status"],
            Self::CustomerId => &["customerId", "customer_id", "Customer.id"],
            Self::CustomerFirstName => &[
                "customerFirstName",
                "customer_first_name",
                "Customer.firstName",
                "Customer.first_name",
            ],
            Self::CustomerLastName => &[
                "customerLastName",
                "customer_last_name",
                "Customer.lastName",
                "Customer.last_name",
            ],
            Self::CustomerName => &["customerName", "customer_name"],
            Self::ProductName => &[
                "productName",
                "product_name",
                "LoanProduct.name",
                "loanProductName",
                "loan_product_name",
            ],
            Self::RequestedAmount => &[
                "requestedAmount",
                "requested_amount",
                "approvedAmount",
                "approved_amount",
            ],
            Self::RequestedTermDays => &[
                "requestedTermDays",
                "requested_term_days",
                "approvedTermDays",
                "approved_term_days",
            ],
            Self::ProductFixedTermDays => &["productFixedTermDays", "product_fixed_term_days"],
            Self::InterestRate => &[
                "productInterestRate",
                "product_interest_rate",
                "approvedInterestRate",
                "approved_interest_rate",
            ],
            Self::ProcessingFeePercent => &[
                "productProcessingFeePercent",
                "product_processing_fee_percent",
            ],
            Self::PlatformFee => &["productPlatformFee", "product_platform_fee"],
            Self::PaymentFrequency => &["productPaymentFrequency", "product_payment_frequency"],
            Self::InterestType => &["productInterestType", "product_interest_type"],
            Self::DeductInterestInAdvance => {
                &["deductInterestInAdvance", "deduct_interest_in_advance"]
            }
            Self::DeductProcessingFeeInAdvance => &[
                "deductProcessingFeeInAdvance",
                "deduct_processing_fee_in_advance",
            ],
            Self::DeductPlatformFeeInAdvance => {
                &["deductPlatformFeeInAdvance", "deduct_platform_fee_in_advance"]
            }
            Self::CollectorId => &["collectorId", "collector_id", "assignedCollectorId"],
        }
    }
}

static KEY_INDEX: OnceLock<HashMap<&'static str, LogicalField>> = OnceLock::new();

/// Reverse lookup from a top-level payload key to the field it spells.
pub fn logical_field_for_key(key: &str) -> Option<LogicalField> {
    key_index().get(key).copied()
}

fn key_index() -> &'static HashMap<&'static str, LogicalField> {
    KEY_INDEX.get_or_init(|| {
        let mut index = HashMap::new();
        for field in LogicalField::all() {
            for &key in field.candidate_keys() {
                let top_level = key.split('.').next().unwrap_or(key);
                index.entry(top_level).or_insert(field);
            }
        }
        index
    })
}
