//! Export pipeline
//!
//! validate → authenticate → fetch → connect → load, strictly in sequence.
//! Each stage short-circuits the run with its own `ExportError` variant; nothing
//! is retried and documents written before a failure stay written.
//!
//! The remote services sit behind [`Connector`], [`ReportSource`] and
//! [`DocumentSink`] so the orchestration can be driven without a network.

use crate::analytics::{AnalyticsClient, Report, ReportQuery};
use crate::config::ExportConfig;
use crate::document::{build_document, Document};
use crate::error::ExportError;
use crate::search::{SearchClient, EXPORT_INDEX};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info};

/// Source of report rows (GA4 in production).
pub trait ReportSource {
    fn run_report(&self, query: &ReportQuery) -> Result<Report>;
}

/// Destination for documents (Elasticsearch in production).
pub trait DocumentSink {
    /// Liveness check. Returns a short description of the store for logging.
    fn ping(&self) -> Result<String>;

    /// Write one document. Returns the store-assigned id when the store reports one.
    fn index_document(&self, index: &str, document: &Document) -> Result<Option<String>>;
}

/// Opens the two remote sessions a run needs.
pub trait Connector {
    type Source: ReportSource;
    type Sink: DocumentSink;

    fn authenticate(&self, config: &ExportConfig) -> Result<Self::Source>;
    fn connect(&self, config: &ExportConfig) -> Result<Self::Sink>;
}

impl ReportSource for AnalyticsClient {
    fn run_report(&self, query: &ReportQuery) -> Result<Report> {
        AnalyticsClient::run_report(self, query)
    }
}

impl DocumentSink for SearchClient {
    fn ping(&self) -> Result<String> {
        let info = SearchClient::ping(self)?;
        Ok(format!(
            "cluster {} (version {})",
            info.cluster_name.as_deref().unwrap_or("unknown"),
            info.version
                .and_then(|v| v.number)
                .as_deref()
                .unwrap_or("unknown")
        ))
    }

    fn index_document(&self, index: &str, document: &Document) -> Result<Option<String>> {
        SearchClient::index_document(self, index, document).map(|r| r.id)
    }
}

/// Production wiring: GA4 Data API + Elasticsearch over HTTPS.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    type Source = AnalyticsClient;
    type Sink = SearchClient;

    fn authenticate(&self, config: &ExportConfig) -> Result<AnalyticsClient> {
        AnalyticsClient::authenticate(config.credentials_path())
    }

    fn connect(&self, config: &ExportConfig) -> Result<SearchClient> {
        SearchClient::new(
            &config.store_host,
            config.store_api_key.as_deref(),
            config.verify_certs,
        )
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub property: String,
    pub index: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rows_fetched: usize,
    pub documents_written: usize,
}

/// Validate configuration from `lookup`, then run. No connector call happens
/// unless validation passes; every validation problem is logged on its own line.
pub fn run_from_env<F, C>(lookup: F, connector: &C, today: NaiveDate) -> Result<ExportSummary, ExportError>
where
    F: Fn(&str) -> Option<String>,
    C: Connector,
{
    let config = ExportConfig::from_lookup(lookup).map_err(|errs| {
        for issue in errs.iter() {
            error!("{}. Exiting.", issue);
        }
        ExportError::Configuration(errs)
    })?;

    info!(
        "Configuration: property={}, credentials={}, days={}, limit={}, host={}, api_key={}, verify_certs={}",
        config.property_id,
        config.credentials_path.display(),
        config.days_to_pull,
        config.report_row_limit,
        config.store_host,
        if config.store_api_key.is_some() { "set" } else { "unset" },
        config.verify_certs
    );

    run(&config, connector, today)
}

/// Run every stage after validation against an already validated config.
pub fn run<C: Connector>(
    config: &ExportConfig,
    connector: &C,
    today: NaiveDate,
) -> Result<ExportSummary, ExportError> {
    let query = ReportQuery::trailing_window(
        &config.property_id,
        config.days_to_pull,
        config.report_row_limit,
        today,
    )
    .map_err(ExportError::Fetch)?;

    let source = connector
        .authenticate(config)
        .map_err(ExportError::Authentication)?;
    info!("Authenticated to Google Analytics.");

    let report = source.run_report(&query).map_err(ExportError::Fetch)?;
    let (start, end) = (query.date_range.start(), query.date_range.end());
    info!(
        "Pulled {} GA rows from {} to {}.",
        report.len(),
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    );
    if let Some(total) = report.total_rows {
        if total > report.len() as i64 {
            info!(
                "Report has {} matching rows; only the first {} were returned (GA_REPORT_LIMIT)",
                total,
                report.len()
            );
        }
    }

    let sink = connector.connect(config).map_err(ExportError::Connection)?;
    let description = sink.ping().map_err(ExportError::Connection)?;
    info!("Connected to Elasticsearch: {}", description);

    let written = load_report(&sink, EXPORT_INDEX, &report, Utc::now)?;
    info!(
        "Successfully sent GA data to Elasticsearch index: {}",
        EXPORT_INDEX
    );

    Ok(ExportSummary {
        property: query.property(),
        index: EXPORT_INDEX.to_string(),
        start_date: start,
        end_date: end,
        rows_fetched: report.len(),
        documents_written: written,
    })
}

/// Write one document per row, in row order, stopping at the first failure.
///
/// `clock` is read once per document, just before it is built.
pub fn load_report<S, F>(
    sink: &S,
    index: &str,
    report: &Report,
    mut clock: F,
) -> Result<usize, ExportError>
where
    S: DocumentSink,
    F: FnMut() -> DateTime<Utc>,
{
    let mut written = 0usize;

    for (i, row) in report.rows.iter().enumerate() {
        let result = build_document(&report.dimension_headers, &report.metric_headers, row, clock())
            .and_then(|doc| sink.index_document(index, &doc));

        match result {
            Ok(id) => {
                written += 1;
                debug!(
                    "Row {} stored as {}",
                    i + 1,
                    id.as_deref().unwrap_or("<no id>")
                );
            }
            Err(source) => {
                return Err(ExportError::Write {
                    index: index.to_string(),
                    position: i + 1,
                    written,
                    source,
                })
            }
        }
    }

    Ok(written)
}
