use async_trait::async_trait;

use super::domain::{CalculationPreview, CalculationRequest};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("calculator unreachable: {0}")]
    Transport(String),
    #[error("calculator rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("calculator response could not be read: {0}")]
    Decode(String),
}

impl CalculatorError {
    /// Short text suitable for the "unavailable" banner.
    pub fn user_message(&self) -> String {
        match self {
            CalculatorError::Rejected { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            _ => "Unable to calculate loan preview".to_string(),
        }
    }
}

/// Remote loan calculator. Owns every formula; callers only send the request
/// and display what comes back.
#[async_trait]
pub trait CalculatorGateway: Send + Sync {
    async fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationPreview, CalculatorError>;
}
