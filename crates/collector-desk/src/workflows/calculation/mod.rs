//! Loan preview requests for the approval form.

mod builder;
mod debounce;
mod domain;
mod gateway;

pub use builder::{
    build_request, term_months, CalculationRequestBuilder, DEFAULT_INTEREST_RATE,
    DEFAULT_TERM_DAYS,
};
pub use debounce::{CalculationState, DebouncedCalculator, DEFAULT_DEBOUNCE_WINDOW};
pub use domain::{
    ApproveForm, CalculationPreview, CalculationRequest, CalculationResult, DeductionFlags,
    FormOverrides, LoanApplicationRecord, ProductTerms, SchedulePreviewItem,
};
pub use gateway::{CalculatorError, CalculatorGateway};
