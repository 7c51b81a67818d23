use serde::{Deserialize, Serialize};

use super::domain::CashBalanceSnapshot;

/// Differences below one centavo are rounding noise.
pub const VARIANCE_TOLERANCE: f64 = 0.01;

const HEALTHY_PERCENT: f64 = 75.0;
const LOW_PERCENT: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceKind {
    Balanced,
    Over,
    Short,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandoverRejection {
    #[error("day already closed; handover cannot be initiated again")]
    DayClosed,
    #[error("enter the actual handover amount")]
    MissingAmount,
}

/// Body for the initiate-handover call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverSubmission {
    pub actual_handover: f64,
    #[serde(skip)]
    pub variance: f64,
    /// The collector must acknowledge the variance before submitting.
    #[serde(skip)]
    pub requires_acknowledgement: bool,
}

/// End-of-day arithmetic over the latest balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandoverPlan {
    expected: f64,
    day_closed: bool,
}

impl HandoverPlan {
    pub fn from_balance(balance: &CashBalanceSnapshot) -> Self {
        Self {
            expected: balance.opening_float + balance.total_collections
                - balance.total_disbursements,
            day_closed: balance.is_day_closed,
        }
    }

    pub fn expected_handover(&self) -> f64 {
        self.expected
    }

    pub fn variance(&self, actual: f64) -> f64 {
        actual - self.expected
    }

    pub fn has_variance(&self, actual: f64) -> bool {
        self.variance(actual).abs() > VARIANCE_TOLERANCE
    }

    pub fn variance_kind(&self, actual: f64) -> VarianceKind {
        let variance = self.variance(actual);
        if variance.abs() <= VARIANCE_TOLERANCE {
            VarianceKind::Balanced
        } else if variance > 0.0 {
            VarianceKind::Over
        } else {
            VarianceKind::Short
        }
    }

    pub fn prepare(&self, actual: f64) -> Result<HandoverSubmission, HandoverRejection> {
        if self.day_closed {
            return Err(HandoverRejection::DayClosed);
        }
        if !actual.is_finite() || actual <= 0.0 {
            return Err(HandoverRejection::MissingAmount);
        }

        Ok(HandoverSubmission {
            actual_handover: actual,
            variance: self.variance(actual),
            requires_acknowledgement: self.has_variance(actual),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Healthy,
    Low,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceHealth {
    pub percentage: f64,
    pub band: HealthBand,
}

impl BalanceHealth {
    pub fn from_balance(balance: &CashBalanceSnapshot) -> Self {
        if balance.opening_float == 0.0 {
            return Self {
                percentage: 0.0,
                band: HealthBand::Critical,
            };
        }

        let percentage = balance.current_balance / balance.opening_float * 100.0;
        let band = if percentage >= HEALTHY_PERCENT {
            HealthBand::Healthy
        } else if percentage >= LOW_PERCENT {
            HealthBand::Low
        } else {
            HealthBand::Critical
        };

        Self { percentage, band }
    }
}
