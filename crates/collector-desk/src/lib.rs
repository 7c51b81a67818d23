//! Client-side core for the field-collector surfaces of the lending platform.
//!
//! Two concerns live here: normalizing API payloads whose field names and
//! wrapping drift between backend versions, and deciding from the polled cash
//! custody signals whether a collector may act on the current day.

pub mod config;
pub mod error;
pub mod remote;
pub mod telemetry;
pub mod workflows;
