//! Report fetching and response flattening.
//!
//! The Data API returns rows of positional dimension and metric values; the
//! order of `REPORT_METRICS` drives both the request and the unpacking, so
//! the two can never disagree.

use async_trait::async_trait;
use serde::Serialize;

use crate::analytics::{DataApiClient, DateRange, RunReportRequest, RunReportResponse};
use crate::error::ApiError;

/// The fixed metric set: Data API name and display label, in report order.
pub const REPORT_METRICS: [(&str, &str); 6] = [
    ("sessions", "Sessions"),
    ("totalUsers", "Total Users"),
    ("screenPageViews", "Screen Pageviews"),
    ("conversions", "Conversions"),
    ("eventCount", "Event Count"),
    ("userEngagementDuration", "User Engagement Duration"),
];

/// API names of the fixed metric set, in request order.
pub fn metric_names() -> Vec<&'static str> {
    REPORT_METRICS.iter().map(|(name, _)| *name).collect()
}

/// One report row: a date string and one value per requested metric, in
/// request order. Values are kept verbatim as the upstream strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub date: String,
    pub values: Vec<String>,
}

/// Flattened report, one row per distinct date, in upstream order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportTable {
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Flatten a runReport response into a table.
///
/// Every row must carry exactly `metric_count` metric values; a shorter or
/// longer row means the response no longer lines up with the request and is
/// rejected rather than silently truncated.
pub fn flatten_response(
    response: &RunReportResponse,
    metric_count: usize,
) -> Result<ReportTable, ApiError> {
    let mut rows = Vec::with_capacity(response.rows.len());

    for (i, row) in response.rows.iter().enumerate() {
        let date = row
            .dimension_values
            .first()
            .map(|d| d.value.clone())
            .ok_or_else(|| {
                ApiError::MalformedResponse(format!("row {} has no dimension value", i))
            })?;

        if row.metric_values.len() != metric_count {
            return Err(ApiError::MalformedResponse(format!(
                "row {} has {} metric values, expected {}",
                i,
                row.metric_values.len(),
                metric_count
            )));
        }

        rows.push(ReportRow {
            date,
            values: row.metric_values.iter().map(|m| m.value.clone()).collect(),
        });
    }

    Ok(ReportTable { rows })
}

/// One metric's chart series.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSeries {
    pub name: String,
    pub label: String,
    pub values: Vec<f64>,
}

/// Column-oriented view model for templates and charts: one dates vector
/// with a parallel numeric series per metric.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSeries {
    pub dates: Vec<String>,
    pub series: Vec<MetricSeries>,
}

impl ReportSeries {
    /// Build the view model from a table.
    ///
    /// Rows are sorted by date here so chart rendering is deterministic; the
    /// upstream ordering guarantee is unconfirmed and the table itself keeps
    /// whatever order the service returned. Both wire date forms (YYYYMMDD
    /// and YYYY-MM-DD) sort correctly as strings.
    pub fn from_table(table: &ReportTable) -> Self {
        let mut rows: Vec<&ReportRow> = table.rows.iter().collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));

        let dates: Vec<String> = rows.iter().map(|r| r.date.clone()).collect();

        let series = REPORT_METRICS
            .iter()
            .enumerate()
            .map(|(j, (name, label))| MetricSeries {
                name: (*name).to_string(),
                label: (*label).to_string(),
                values: rows
                    .iter()
                    .map(|r| {
                        // Non-numeric upstream values chart as zero.
                        r.values.get(j).and_then(|v| v.parse().ok()).unwrap_or(0.0)
                    })
                    .collect(),
            })
            .collect();

        Self { dates, series }
    }
}

/// Seam between the HTTP layer and the upstream call, so routes can be
/// exercised against a stub.
#[async_trait]
pub trait ReportFetcher: Send + Sync {
    async fn fetch_report(&self, date_range: DateRange) -> Result<ReportTable, ApiError>;
}

/// Production fetcher: one typed runReport call, flattened.
pub struct ReportService {
    client: DataApiClient,
    property_id: String,
}

impl ReportService {
    pub fn new(client: DataApiClient, property_id: String) -> Self {
        Self {
            client,
            property_id,
        }
    }
}

#[async_trait]
impl ReportFetcher for ReportService {
    async fn fetch_report(&self, date_range: DateRange) -> Result<ReportTable, ApiError> {
        let request = RunReportRequest::daily(date_range, &metric_names());
        let response = self.client.run_report(&self.property_id, &request).await?;
        flatten_response(&response, REPORT_METRICS.len())
    }
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService")
            .field("property_id", &self.property_id)
            .finish()
    }
}
