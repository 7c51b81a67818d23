use collector_desk::error::AppError;
use collector_desk::workflows::calculation::CalculatorGateway;
use collector_desk::workflows::custody::StatusFailurePolicy;
use collector_desk::workflows::payload::unwrap_object;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) calculator: Arc<dyn CalculatorGateway>,
}

pub(crate) fn parse_policy(raw: &str) -> Result<StatusFailurePolicy, String> {
    raw.parse::<StatusFailurePolicy>()
        .map_err(|value| format!("expected fail_open or fail_closed, got '{value}'"))
}

/// Reads an application export. Accepts the bare record or one wrapped in
/// `data` and/or `application`.
pub(crate) fn read_application(path: &Path) -> Result<Value, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let body: Value = serde_json::from_str(&raw).map_err(invalid_data)?;
    Ok(unwrap_object(body, Some("application")).unwrap_or(Value::Null))
}

pub(crate) fn invalid_data(err: serde_json::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, err)
}
