//! Tolerant readers for lending API payloads.
//!
//! Field names and response envelopes have drifted across backend versions;
//! everything here degrades to a documented default instead of failing.

pub mod lenient;
mod mapping;
mod normalizer;
mod resolver;
mod unwrap;

pub use mapping::{logical_field_for_key, LogicalField};
pub use normalizer::{
    normalize_application_status, normalize_frequency, normalize_interest_type,
    ApplicationStatus, InterestType, PaymentFrequency,
};
pub use resolver::{resolve_bool, resolve_identifier, resolve_number, resolve_string};
pub use unwrap::{
    collection_shape, into_collection, unwrap_collection, unwrap_object, unwrap_typed,
    CollectionShape,
};

use serde_json::{Map, Value};

/// Resolves a logical field through the shared key table.
pub fn field_number(record: &Map<String, Value>, field: LogicalField) -> Option<f64> {
    resolve_number(record, field.candidate_keys())
}

pub fn field_string(record: &Map<String, Value>, field: LogicalField) -> Option<String> {
    resolve_string(record, field.candidate_keys())
}

pub fn field_bool(record: &Map<String, Value>, field: LogicalField) -> Option<bool> {
    resolve_bool(record, field.candidate_keys())
}

pub fn field_identifier(record: &Map<String, Value>, field: LogicalField) -> Option<String> {
    resolve_identifier(record, field.candidate_keys())
}
