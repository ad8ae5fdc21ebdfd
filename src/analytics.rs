//! Typed client for the Google Analytics Data API (v1beta) runReport call.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::AuthClient;
use crate::error::ApiError;

/// Production base URL of the Data API.
const DATA_API_BASE_URL: &str = "https://analyticsdata.googleapis.com/v1beta";

/// Date range of a report request. Accepts "YYYY-MM-DD" and the relative
/// forms the Data API understands ("today", "NdaysAgo").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

/// A requested report dimension.
#[derive(Debug, Clone, Serialize)]
pub struct Dimension {
    pub name: String,
}

/// A requested report metric.
#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub name: String,
}

/// Body of a runReport request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    pub date_ranges: Vec<DateRange>,
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
}

impl RunReportRequest {
    /// Single-range, single-dimension request over an ordered metric list.
    /// The metric order here drives positional unpacking of the response.
    pub fn daily(date_range: DateRange, metric_names: &[&str]) -> Self {
        Self {
            date_ranges: vec![date_range],
            dimensions: vec![Dimension {
                name: "date".to_string(),
            }],
            metrics: metric_names
                .iter()
                .map(|name| Metric {
                    name: (*name).to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DimensionHeader {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricHeader {
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub metric_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DimensionValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MetricValue {
    #[serde(default)]
    pub value: String,
}

/// One response row: dimension values then metric values, both positional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRow {
    #[serde(default)]
    pub dimension_values: Vec<DimensionValue>,
    #[serde(default)]
    pub metric_values: Vec<MetricValue>,
}

/// runReport response. `rows` is absent entirely for an empty report.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<DimensionHeader>,
    #[serde(default)]
    pub metric_headers: Vec<MetricHeader>,
    #[serde(default)]
    pub rows: Vec<ResponseRow>,
    #[serde(default)]
    pub row_count: i64,
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[allow(dead_code)]
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Data API client.
#[derive(Clone)]
pub struct DataApiClient {
    base_url: String,
    http_client: Client,
    auth_client: AuthClient,
}

impl DataApiClient {
    /// Create a client against the production Data API.
    ///
    /// # Errors
    /// Returns `ApiError::HttpClientInit` if the HTTP client cannot be created.
    pub fn new(auth_client: AuthClient, timeout: std::time::Duration) -> Result<Self, ApiError> {
        Self::with_base_url(DATA_API_BASE_URL.to_string(), auth_client, timeout)
    }

    /// Create a client against an explicit base URL (used by tests).
    pub fn with_base_url(
        base_url: String,
        auth_client: AuthClient,
        timeout: std::time::Duration,
    ) -> Result<Self, ApiError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClientInit(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
            auth_client,
        })
    }

    /// Run one report against a property.
    pub async fn run_report(
        &self,
        property_id: &str,
        request: &RunReportRequest,
    ) -> Result<RunReportResponse, ApiError> {
        let url = format!("{}/properties/{}:runReport", self.base_url, property_id);

        tracing::debug!(%url, "running report");

        let token = self.auth_client.get_token().await?;

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle HTTP response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                ApiError::MalformedResponse(format!(
                    "failed to parse response: {} - body: {}",
                    e,
                    &body[..body.len().min(200)]
                ))
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            parse_error_response(status, &body)
        }
    }
}

/// Parse an error body, preferring the structured Google envelope.
fn parse_error_response<T>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorResponse>(body) {
        Err(ApiError::Upstream {
            status,
            code: envelope.error.status,
            message: envelope.error.message,
        })
    } else {
        Err(ApiError::HttpError {
            status,
            body: body.to_string(),
        })
    }
}

impl std::fmt::Debug for DataApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
