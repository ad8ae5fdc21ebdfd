//! GA4 Reporting Dashboard
//!
//! Fetches a fixed metric set from the Google Analytics Data API and serves
//! it as line charts and CSV exports.

mod analytics;
mod auth;
mod charts;
mod config;
mod error;
mod export;
mod report;
mod server;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::analytics::{DataApiClient, DateRange};
use crate::auth::AuthClient;
use crate::config::Config;
use crate::report::ReportService;
use crate::server::AppState;

#[derive(Parser, Debug)]
#[command(name = "ga4-dashboard")]
#[command(author, version, about = "GA4 reporting dashboard", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Listen address override (e.g. 0.0.0.0:8080)
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration and resolve credentials before anything touches
    // the network.
    let config = Config::load(&args.config)?;
    let key = config.credentials()?;

    tracing::info!(
        property_id = %config.property_id,
        client_email = %key.client_email,
        "Configuration loaded"
    );

    let auth_client = AuthClient::new(key, config.timeout(), config.token_buffer())?;
    let data_client = DataApiClient::new(auth_client, config.timeout())?;
    let report_service = ReportService::new(data_client, config.property_id.clone());

    let date_range = DateRange {
        start_date: config.start_date.clone(),
        end_date: config.end_date.clone(),
    };

    let state = AppState::new(
        Arc::new(report_service),
        date_range,
        config.export_path.clone(),
    )?;

    let listen_addr = args.listen.unwrap_or_else(|| config.listen_addr.clone());
    server::run(state, &listen_addr).await
}
