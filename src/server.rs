//! HTTP server: dashboard page, CSV export, health.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::analytics::DateRange;
use crate::charts;
use crate::error::ApiError;
use crate::export;
use crate::report::{ReportFetcher, ReportSeries};

const DASHBOARD_TEMPLATE: &str = include_str!("../templates/dashboard.html.hbs");

/// Application state shared across handlers.
pub struct AppState {
    pub fetcher: Arc<dyn ReportFetcher>,
    pub date_range: DateRange,
    /// When set, every successful dashboard fetch overwrites this CSV file.
    pub export_path: Option<String>,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(
        fetcher: Arc<dyn ReportFetcher>,
        date_range: DateRange,
        export_path: Option<String>,
    ) -> Result<Self, handlebars::TemplateError> {
        let mut templates = Handlebars::new();
        templates.register_template_string("dashboard", DASHBOARD_TEMPLATE)?;

        Ok(Self {
            fetcher,
            date_range,
            export_path,
            templates,
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/export.csv", get(export_csv))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server.
pub async fn run(state: AppState, addr: &str) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Map a fetch error onto the response status. Upstream and credential
/// rejections are gateway failures; only local faults are 500s.
fn api_error_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Auth(_)
        | ApiError::Request(_)
        | ApiError::HttpError { .. }
        | ApiError::Upstream { .. }
        | ApiError::JsonParse(_)
        | ApiError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        ApiError::HttpClientInit(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fetch_failure(err: ApiError) -> (StatusCode, String) {
    error!("Report fetch failed: {}", err);
    (api_error_status(&err), format!("Error: {}", err))
}

/// `GET /` — fetch the report and render one line chart per metric.
async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let table = state
        .fetcher
        .fetch_report(state.date_range.clone())
        .await
        .map_err(fetch_failure)?;

    if let Some(path) = &state.export_path {
        export::write_file(path, &table).map_err(|e| {
            error!("CSV snapshot write failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        })?;
    }

    let series = ReportSeries::from_table(&table);
    let chart_sections: Vec<serde_json::Value> = series
        .series
        .iter()
        .map(|s| {
            json!({
                "label": s.label,
                "svg": charts::line_chart(s, &series.dates),
            })
        })
        .collect();

    let html = state
        .templates
        .render(
            "dashboard",
            &json!({
                "start_date": state.date_range.start_date,
                "end_date": state.date_range.end_date,
                "row_count": table.len(),
                "charts": chart_sections,
            }),
        )
        .map_err(|e| {
            error!("Template render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        })?;

    Ok(Html(html))
}

/// `GET /export.csv` — the same report as a CSV attachment.
async fn export_csv(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let table = state
        .fetcher
        .fetch_report(state.date_range.clone())
        .await
        .map_err(fetch_failure)?;

    let body = export::render(&table).map_err(|e| {
        error!("CSV render failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"analytics_data.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportRow, ReportTable};
    use async_trait::async_trait;
    use axum_test::TestServer;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Fetcher stub returning queued results, one per call.
    struct StubFetcher {
        results: Mutex<VecDeque<Result<ReportTable, ApiError>>>,
    }

    impl StubFetcher {
        fn new(results: Vec<Result<ReportTable, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
            })
        }
    }

    #[async_trait]
    impl ReportFetcher for StubFetcher {
        async fn fetch_report(&self, _date_range: DateRange) -> Result<ReportTable, ApiError> {
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .expect("no stubbed result left")
        }
    }

    fn table(date: &str) -> ReportTable {
        ReportTable {
            rows: vec![ReportRow {
                date: date.to_string(),
                values: ["10", "5", "100", "1", "50", "300"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }],
        }
    }

    fn range() -> DateRange {
        DateRange {
            start_date: "2023-08-17".to_string(),
            end_date: "2023-08-23".to_string(),
        }
    }

    fn server(fetcher: Arc<StubFetcher>, export_path: Option<String>) -> TestServer {
        let state = AppState::new(fetcher, range(), export_path).unwrap();
        TestServer::new(router(Arc::new(state))).unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_renders_six_charts() {
        let srv = server(StubFetcher::new(vec![Ok(table("20230817"))]), None);

        let res = srv.get("/").await;
        res.assert_status_ok();
        let body = res.text();
        assert_eq!(body.matches("<svg").count(), 6);
        assert!(body.contains("Sessions Over Time"));
        assert!(body.contains("User Engagement Duration Over Time"));
        assert!(body.contains("2023-08-17"));
    }

    #[tokio::test]
    async fn test_dashboard_upstream_error_maps_to_502() {
        let srv = server(
            StubFetcher::new(vec![Err(ApiError::Upstream {
                status: StatusCode::BAD_REQUEST,
                code: "INVALID_ARGUMENT".to_string(),
                message: "bad property".to_string(),
            })]),
            None,
        );

        let res = srv.get("/").await;
        res.assert_status(StatusCode::BAD_GATEWAY);
        let body = res.text();
        assert!(body.starts_with("Error: "));
        assert!(body.contains("bad property"));
    }

    #[tokio::test]
    async fn test_dashboard_reflects_latest_fetch_only() {
        let srv = server(
            StubFetcher::new(vec![Ok(table("20230817")), Ok(table("20230915"))]),
            None,
        );

        let first = srv.get("/").await.text();
        assert!(first.contains("20230817"));

        let second = srv.get("/").await.text();
        assert!(second.contains("20230915"));
        assert!(!second.contains("20230817"));
    }

    #[tokio::test]
    async fn test_dashboard_writes_csv_snapshot_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics_data.csv");
        let srv = server(
            StubFetcher::new(vec![Ok(table("20230817")), Ok(ReportTable::default())]),
            Some(path.display().to_string()),
        );

        srv.get("/").await.assert_status_ok();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("20230817"));

        // A zero-row fetch leaves only the header behind.
        srv.get("/").await.assert_status_ok();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Date,Sessions,Total Users,Screen Pageviews,Conversions,Event Count,User Engagement Duration\n"
        );
    }

    #[tokio::test]
    async fn test_export_csv_attachment() {
        let srv = server(StubFetcher::new(vec![Ok(table("2023-08-17"))]), None);

        let res = srv.get("/export.csv").await;
        res.assert_status_ok();
        assert_eq!(res.header(header::CONTENT_TYPE), "text/csv; charset=utf-8");
        assert!(res
            .header(header::CONTENT_DISPOSITION)
            .to_str()
            .unwrap()
            .contains("analytics_data.csv"));
        assert_eq!(
            res.text(),
            "Date,Sessions,Total Users,Screen Pageviews,Conversions,Event Count,User Engagement Duration\n\
             2023-08-17,10,5,100,1,50,300\n"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let srv = server(StubFetcher::new(vec![]), None);
        let res = srv.get("/health").await;
        res.assert_status_ok();
        assert!(res.text().contains("healthy"));
    }

    #[test]
    fn test_api_error_status_mapping() {
        let upstream = ApiError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            code: "RESOURCE_EXHAUSTED".to_string(),
            message: "quota".to_string(),
        };
        assert_eq!(api_error_status(&upstream), StatusCode::BAD_GATEWAY);

        let auth = ApiError::Auth(crate::error::AuthError::TokenParse("bad".to_string()));
        assert_eq!(api_error_status(&auth), StatusCode::BAD_GATEWAY);

        let init = ApiError::HttpClientInit("tls".to_string());
        assert_eq!(api_error_status(&init), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
