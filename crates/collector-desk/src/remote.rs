//! HTTP gateway to the lending API.
//!
//! Every response body goes through the payload unwrapper before it is
//! decoded, so endpoint envelope changes never reach the workflows.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::DeskConfig;
use crate::workflows::calculation::{
    CalculationPreview, CalculationRequest, CalculationResult, CalculatorError, CalculatorGateway,
    SchedulePreviewItem,
};
use crate::workflows::custody::{
    CashBalanceSnapshot, FloatOffer, HandoverRecord, HandoverSubmission, OverdueStatus,
    StatusFetchError, StatusSource,
};
use crate::workflows::feed::{CollectionKind, CollectionSource, FeedError};
use crate::workflows::payload::{into_collection, unwrap_object, unwrap_typed};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http client could not be built: {0}")]
    Client(#[source] reqwest::Error),
    #[error("lending api base url {0:?} cannot carry a path")]
    BaseUrl(String),
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },
    #[error("{path} returned an unreadable body: {message}")]
    Decode { path: String, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport { source, .. } => source.status().map(|code| code.as_u16()),
            ApiError::Client(_) | ApiError::BaseUrl(_) | ApiError::Decode { .. } => None,
        }
    }
}

impl From<ApiError> for StatusFetchError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Status { status, .. } => StatusFetchError::Status { status },
            ApiError::Decode { message, .. } => StatusFetchError::Decode(message),
            other => StatusFetchError::Transport(other.to_string()),
        }
    }
}

impl From<ApiError> for CalculatorError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Status {
                status, message, ..
            } => CalculatorError::Rejected { status, message },
            ApiError::Decode { message, .. } => CalculatorError::Decode(message),
            other => CalculatorError::Transport(other.to_string()),
        }
    }
}

impl From<ApiError> for FeedError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Status { status, .. } => FeedError::Status { status },
            ApiError::Decode { message, .. } => FeedError::Decode(message),
            other => FeedError::Transport(other.to_string()),
        }
    }
}

/// Authenticated client for the money-loan API.
#[derive(Clone)]
pub struct LendingApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl LendingApiClient {
    pub fn new(config: &DeskConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(ApiError::Client)?;

        let raw = config.api_base_url.trim_end_matches('/');
        let base_url = Url::parse(raw).map_err(|_| ApiError::BaseUrl(raw.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(raw.to_string()));
        }

        Ok(Self {
            http,
            base_url,
            token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends each segment to the base path. Segments are percent-encoded,
    /// so a `/`, `?` or `..` inside one never changes the target path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let request = self.authorize(self.http.get(url).query(query));
        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;
        read_json(&path, response).await
    }

    async fn post_json<B: Serialize + ?Sized + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let request = self.authorize(self.http.post(url).json(body));
        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;
        read_json(&path, response).await
    }

    /// Starts the end-of-day handover. The cashier confirms it separately.
    pub async fn initiate_handover(
        &self,
        submission: &HandoverSubmission,
    ) -> Result<Option<HandoverRecord>, ApiError> {
        let body = self.post_json(&["cash", "initiate-handover"], submission).await?;
        Ok(unwrap_object(body, None).and_then(|data| HandoverRecord::from_value(&data)))
    }
}

impl std::fmt::Debug for LendingApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LendingApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

async fn read_json(path: &str, response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    response.json::<Value>().await.map_err(|err| ApiError::Decode {
        path: path.to_string(),
        message: err.to_string(),
    })
}

/// Pulls `message` or `error` out of a JSON error body, falling back to the
/// raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(message_field)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

fn message_field(body: &Value) -> Option<&str> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
}

fn decode_error(path: &str, err: serde_json::Error) -> ApiError {
    ApiError::Decode {
        path: path.to_string(),
        message: err.to_string(),
    }
}

/// `data: null` and empty bodies mean "no balance row yet".
pub fn parse_balance(body: Value) -> Result<Option<CashBalanceSnapshot>, serde_json::Error> {
    if body.is_null() || body.get("data").is_some_and(Value::is_null) {
        return Ok(None);
    }
    match unwrap_object(body, None) {
        Some(data) => serde_json::from_value(data).map(Some),
        None => Ok(None),
    }
}

pub fn parse_handovers(body: Value) -> Vec<HandoverRecord> {
    into_collection(body)
        .iter()
        .filter_map(HandoverRecord::from_value)
        .collect()
}

pub fn parse_overdue(body: Value) -> Result<OverdueStatus, serde_json::Error> {
    match unwrap_object(body, None) {
        Some(data) => serde_json::from_value(data),
        None => Ok(OverdueStatus::default()),
    }
}

/// Keys that mark an object as a calculation breakdown rather than an
/// empty or error envelope.
const RESULT_FIELDS: &[&str] = &[
    "loanAmount",
    "loan_amount",
    "interestAmount",
    "interest_amount",
    "netProceeds",
    "net_proceeds",
    "totalRepayable",
    "total_repayable",
    "installmentAmount",
    "installment_amount",
];

const REJECTED_WITHOUT_MESSAGE: &str = "calculator did not accept the request";

/// Accepts the calculation bare, under `calculation`, or double-wrapped in
/// `data.calculation`; the schedule sits beside it when present.
///
/// A `success: false` envelope is a rejection even on a 2xx answer, and a
/// body without any breakdown field is unreadable rather than all zeroes.
pub fn parse_preview(body: Value) -> Result<CalculationPreview, CalculatorError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(CalculatorError::Rejected {
            status: 200,
            message: message_field(&body)
                .unwrap_or(REJECTED_WITHOUT_MESSAGE)
                .to_string(),
        });
    }

    let Some(mut data) = unwrap_object(body, None) else {
        return Err(CalculatorError::Decode(
            "calculator answered without an object".to_string(),
        ));
    };

    let schedule = data
        .as_object_mut()
        .and_then(|fields| fields.remove("schedule"))
        .map(unwrap_typed::<SchedulePreviewItem>)
        .unwrap_or_default();

    let inner = unwrap_object(data, Some("calculation"))
        .filter(carries_result)
        .ok_or_else(|| {
            CalculatorError::Decode("calculator answered without a breakdown".to_string())
        })?;
    let calculation = serde_json::from_value::<CalculationResult>(inner)
        .map_err(|err| CalculatorError::Decode(err.to_string()))?;

    Ok(CalculationPreview {
        calculation,
        schedule,
    })
}

fn carries_result(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|fields| RESULT_FIELDS.iter().any(|key| fields.contains_key(*key)))
}

#[async_trait]
impl StatusSource for LendingApiClient {
    async fn cash_balance(
        &self,
        collector_id: &str,
    ) -> Result<Option<CashBalanceSnapshot>, StatusFetchError> {
        const PATH: &[&str] = &["cash", "balance"];
        let body = self.get_json(PATH, &[("collectorId", collector_id)]).await?;
        Ok(parse_balance(body).map_err(|err| decode_error("/cash/balance", err))?)
    }

    async fn pending_floats(&self) -> Result<Vec<FloatOffer>, StatusFetchError> {
        let body = self.get_json(&["cash", "pending-floats"], &[]).await?;
        Ok(unwrap_typed(body))
    }

    async fn pending_handovers(&self) -> Result<Vec<HandoverRecord>, StatusFetchError> {
        let body = self.get_json(&["cash", "pending-handovers"], &[]).await?;
        Ok(parse_handovers(body))
    }

    async fn overdue_status(&self, collector_id: &str) -> Result<OverdueStatus, StatusFetchError> {
        let body = self
            .get_json(&["cash", "collector", collector_id, "overdue"], &[])
            .await?;
        Ok(parse_overdue(body).map_err(|err| decode_error("/cash/collector/overdue", err))?)
    }
}

#[async_trait]
impl CalculatorGateway for LendingApiClient {
    async fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationPreview, CalculatorError> {
        debug!(
            loan_amount = request.loan_amount,
            term_months = request.term_months,
            "requesting loan calculation"
        );
        let body = self.post_json(&["calculate"], request).await?;
        parse_preview(body)
    }
}

#[async_trait]
impl CollectionSource for LendingApiClient {
    async fn fetch_collection(
        &self,
        kind: CollectionKind,
        collector_id: &str,
    ) -> Result<Value, FeedError> {
        Ok(self.get_json(&kind.segments(collector_id), &[]).await?)
    }
}
