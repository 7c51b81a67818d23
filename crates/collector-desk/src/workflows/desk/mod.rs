//! HTTP-facing facade over the custody and calculation workflows.

pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use router::desk_router;
pub use service::{
    calculation_request, is_collector_id, unwrap_payload, CalculationRequestInput, CalculationRequestView,
    CollectorDeskService, DayStateView, DeskServiceError, GateDecisionView, UnwrapView,
};
