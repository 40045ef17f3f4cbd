//! GA4 → Elasticsearch export job
//!
//! Pulls the trailing GA_DAYS_TO_PULL days of page views and sessions per
//! (date, pagePath) from a GA4 property and indexes each row into the
//! `ga4-data` index. Runs once and exits; scheduling is external.
//!
//! Environment:
//!   GA_PROPERTY_ID - GA4 property id (required)
//!   GA_CREDENTIALS_PATH - Service account JSON key file (required)
//!   GA_DAYS_TO_PULL - Trailing window in days (default: 30)
//!   GA_REPORT_LIMIT - Max rows requested (default: 100000)
//!   ELASTICSEARCH_HOST - Elasticsearch URL (required)
//!   ELASTICSEARCH_API_KEY - Elasticsearch API key (optional)
//!   ELASTICSEARCH_VERIFY_CERTS - Set to false to skip TLS verification (default: true)
//!   LOG_LEVEL - Log verbosity (default: INFO; RUST_LOG wins when set)
//!
//! Exit code is 0 on success (including an empty report) and 1 on any failure.

use chrono::Local;
use dotenv::dotenv;
use ga4_export::config::{log_filter_directive, ENV_LOG_LEVEL};
use ga4_export::pipeline::{run_from_env, HttpConnector};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    load_env();
    init_tracing();

    let today = Local::now().date_naive();

    match run_from_env(|key| env::var(key).ok(), &HttpConnector, today) {
        Ok(summary) => {
            info!(
                "Export complete: {} rows from {} ({} to {}) written to {}",
                summary.documents_written,
                summary.property,
                summary.start_date,
                summary.end_date,
                summary.index
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{} (stage: {})", e, e.stage());
            ExitCode::from(e.exit_code())
        }
    }
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the crate directory
    let _ = dotenv();

    let local = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if local.exists() {
        let _ = dotenv::from_path(&local);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = log_filter_directive(env::var(ENV_LOG_LEVEL).ok().as_deref());
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
