use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use super::domain::{CalculationPreview, CalculationRequest};
use super::gateway::CalculatorGateway;

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// What the approval view should show for the current form values.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CalculationState {
    #[default]
    Idle,
    Invalid,
    Scheduled,
    Loading,
    Ready(CalculationPreview),
    Unavailable {
        message: String,
    },
}

impl CalculationState {
    pub fn preview(&self) -> Option<&CalculationPreview> {
        match self {
            CalculationState::Ready(preview) => Some(preview),
            _ => None,
        }
    }
}

/// Coalesces rapid form edits into one remote calculation.
///
/// Each call takes a new generation number, which cancels whatever was
/// scheduled before it. A call only reaches the remote if it is still the
/// latest once its window elapses, and its result is only published if no
/// newer call arrived while it was in flight. One remote call runs at a time.
pub struct DebouncedCalculator {
    gateway: Arc<dyn CalculatorGateway>,
    window: Duration,
    generation: AtomicU64,
    in_flight: Mutex<()>,
    state: watch::Sender<CalculationState>,
}

impl DebouncedCalculator {
    pub fn new(gateway: Arc<dyn CalculatorGateway>, window: Duration) -> Self {
        let (state, _) = watch::channel(CalculationState::Idle);
        Self {
            gateway,
            window,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(()),
            state,
        }
    }

    pub fn with_default_window(gateway: Arc<dyn CalculatorGateway>) -> Self {
        Self::new(gateway, DEFAULT_DEBOUNCE_WINDOW)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn subscribe(&self) -> watch::Receiver<CalculationState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CalculationState {
        self.state.borrow().clone()
    }

    /// Requests a preview for `request`.
    ///
    /// Resolves to `None` when the request is invalid, superseded by a later
    /// call, or failed remotely; failures also move the state to
    /// `Unavailable`. Nothing is retried.
    pub async fn request(
        &self,
        request: CalculationRequest,
        immediate: bool,
    ) -> Option<CalculationPreview> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !request.is_valid() {
            self.state.send_replace(CalculationState::Invalid);
            return None;
        }

        if !immediate {
            self.state.send_replace(CalculationState::Scheduled);
            tokio::time::sleep(self.window).await;
            if self.is_superseded(generation) {
                debug!(generation, "calculation superseded before firing");
                return None;
            }
        }

        let _slot = self.in_flight.lock().await;
        if self.is_superseded(generation) {
            debug!(generation, "calculation superseded while waiting for slot");
            return None;
        }

        self.state.send_replace(CalculationState::Loading);
        let outcome = self.gateway.calculate(&request).await;

        if self.is_superseded(generation) {
            debug!(generation, "discarding stale calculation result");
            return None;
        }

        match outcome {
            Ok(preview) => {
                self.state
                    .send_replace(CalculationState::Ready(preview.clone()));
                Some(preview)
            }
            Err(err) => {
                warn!(error = %err, "loan calculation failed");
                self.state.send_replace(CalculationState::Unavailable {
                    message: err.user_message(),
                });
                None
            }
        }
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

impl std::fmt::Debug for DebouncedCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedCalculator")
            .field("window", &self.window)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::calculation::{CalculationResult, CalculatorError};
    use crate::workflows::payload::{InterestType, PaymentFrequency};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingGateway {
        calls: StdMutex<Vec<CalculationRequest>>,
        latency: Duration,
        fail: AtomicBool,
    }

    impl RecordingGateway {
        fn calls(&self) -> Vec<CalculationRequest> {
            self.calls.lock().expect("calls mutex").clone()
        }
    }

    #[async_trait]
    impl CalculatorGateway for RecordingGateway {
        async fn calculate(
            &self,
            request: &CalculationRequest,
        ) -> Result<CalculationPreview, CalculatorError> {
            self.calls.lock().expect("calls mutex").push(request.clone());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(CalculatorError::Transport("connection reset".into()));
            }
            Ok(CalculationPreview {
                calculation: CalculationResult {
                    loan_amount: request.loan_amount,
                    term_months: request.term_months,
                    ..CalculationResult::default()
                },
                schedule: Vec::new(),
            })
        }
    }

    fn request(amount: f64) -> CalculationRequest {
        CalculationRequest {
            loan_amount: amount,
            term_days: 30,
            term_months: 1,
            payment_frequency: PaymentFrequency::Daily,
            interest_rate: 10.0,
            interest_type: InterestType::Flat,
            processing_fee_percentage: 0.0,
            platform_fee: 0.0,
            late_penalty_percentage: 0.0,
            disbursement_date: Utc.timestamp_opt(0, 0).single().expect("epoch"),
            deduct_platform_fee_in_advance: false,
            deduct_processing_fee_in_advance: false,
            deduct_interest_in_advance: false,
        }
    }

    fn calculator(gateway: Arc<RecordingGateway>) -> DebouncedCalculator {
        DebouncedCalculator::with_default_window(gateway)
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_then_valid_fires_once_with_the_valid_request() {
        let gateway = Arc::new(RecordingGateway::default());
        let calc = calculator(gateway.clone());
        let started = tokio::time::Instant::now();

        let (first, second) = tokio::join!(calc.request(request(0.0), false), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let preview = calc.request(request(5000.0), false).await;
            (preview, started.elapsed())
        });

        assert!(first.is_none());
        let (preview, fired_after) = second;
        assert_eq!(preview.map(|p| p.calculation.loan_amount), Some(5000.0));
        assert!(fired_after >= Duration::from_millis(600));
        assert!(fired_after < Duration::from_millis(610));
        assert_eq!(gateway.calls(), vec![request(5000.0)]);
        assert!(calc.state().preview().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_to_the_last_one() {
        let gateway = Arc::new(RecordingGateway::default());
        let calc = calculator(gateway.clone());

        let (first, second) = tokio::join!(calc.request(request(1000.0), false), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            calc.request(request(2000.0), false).await
        });

        assert!(first.is_none());
        assert!(second.is_some());
        assert_eq!(gateway.calls(), vec![request(2000.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_edit_cancels_a_pending_valid_one() {
        let gateway = Arc::new(RecordingGateway::default());
        let calc = calculator(gateway.clone());

        let (first, second) = tokio::join!(calc.request(request(1000.0), false), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            calc.request(request(-1.0), false).await
        });

        assert!(first.is_none());
        assert!(second.is_none());
        assert!(gateway.calls().is_empty());
        assert_eq!(calc.state(), CalculationState::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_in_flight_result_is_discarded() {
        let gateway = Arc::new(RecordingGateway {
            latency: Duration::from_secs(1),
            ..RecordingGateway::default()
        });
        let calc = calculator(gateway.clone());

        let (first, second) = tokio::join!(calc.request(request(1000.0), true), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            calc.request(request(3000.0), true).await
        });

        assert!(first.is_none());
        assert_eq!(second.map(|p| p.calculation.loan_amount), Some(3000.0));
        assert_eq!(gateway.calls(), vec![request(1000.0), request(3000.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_marks_unavailable_and_clears_previous_result() {
        let gateway = Arc::new(RecordingGateway::default());
        let calc = calculator(gateway.clone());
        assert!(calc.request(request(1000.0), true).await.is_some());
        assert!(calc.state().preview().is_some());

        gateway.fail.store(true, Ordering::SeqCst);
        let mut updates = calc.subscribe();
        assert!(calc.request(request(1500.0), true).await.is_none());
        assert!(updates.has_changed().expect("sender alive"));
        assert_eq!(
            *updates.borrow_and_update(),
            CalculationState::Unavailable {
                message: "Unable to calculate loan preview".to_string()
            }
        );
        assert!(calc.state().preview().is_none());
        assert_eq!(gateway.calls().len(), 2);
    }
}
