//! GA4 Data API client
//!
//! Blocking: the export makes exactly one report call per run.

use crate::analytics::credentials::ServiceAccountKey;
use crate::analytics::report::{Report, ReportQuery, RunReportResponse};
use crate::analytics::token::{fetch_access_token, ANALYTICS_READONLY_SCOPE};
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use std::path::Path;
use tracing::debug;

const ANALYTICS_DATA_API_BASE: &str = "https://analyticsdata.googleapis.com/v1beta";

pub struct AnalyticsClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl AnalyticsClient {
    fn http_client() -> Result<Client> {
        Client::builder()
            .user_agent(concat!("ga4-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build AnalyticsClient")
    }

    /// Load the service-account key at `path` and exchange it for a read-only access token.
    pub fn authenticate(path: &Path) -> Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        debug!("Loaded service account {}", key.client_email);

        let client = Self::http_client()?;
        let token = fetch_access_token(&client, &key, ANALYTICS_READONLY_SCOPE)?;

        Ok(Self {
            client,
            base_url: ANALYTICS_DATA_API_BASE.to_string(),
            access_token: token.access_token,
        })
    }

    /// Client with an already issued token.
    pub fn with_access_token(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Self::http_client()?,
            base_url: ANALYTICS_DATA_API_BASE.to_string(),
            access_token: access_token.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn run_report(&self, query: &ReportQuery) -> Result<Report> {
        let path = format!("/{}:runReport", query.property());
        let url = format!("{}{}", self.base_url, path);

        debug!(
            "POST {} ({} to {}, limit {})",
            path,
            query.date_range.start(),
            query.date_range.end(),
            query.limit
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&query.to_request())
            .send()
            .with_context(|| format!("POST {} failed", path))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!("POST {} {}: {}", path, status, text));
        }

        let body = resp
            .json::<RunReportResponse>()
            .context("Failed to parse runReport response")?;

        Ok(Report::from(body))
    }
}
