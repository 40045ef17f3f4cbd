//! Elasticsearch REST client
//!
//! Only the two calls the loader needs: a liveness ping and single-document indexing.

use crate::document::Document;
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub version: Option<ClusterVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterVersion {
    #[serde(default)]
    pub number: Option<String>,
}

/// Acknowledgement for an indexed document. Any 2xx means the document is stored,
/// so a body that omits `_id` or is not JSON at all still counts as written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexResponse {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

impl SearchClient {
    pub fn new(host: &str, api_key: Option<&str>, verify_certs: bool) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let mut value: HeaderValue = format!("ApiKey {}", key)
                .parse()
                .context("Invalid Elasticsearch API key")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if !verify_certs {
            warn!("TLS certificate verification is DISABLED for {}", host);
        }

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify_certs)
            .build()
            .context("Failed to build SearchClient")?;

        Ok(Self {
            client,
            base_url: host.trim_end_matches('/').to_string(),
        })
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /`. Any transport error or non-2xx status means the cluster is not usable.
    pub fn ping(&self) -> Result<ClusterInfo> {
        let resp = self
            .client
            .get(self.url("/"))
            .send()
            .context("Elasticsearch server not responding")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!("GET / {}: {}", status, text));
        }

        // Some proxies answer the ping without a JSON body.
        Ok(resp.json::<ClusterInfo>().unwrap_or_default())
    }

    /// `POST /{index}/_doc`; the store assigns the document id.
    pub fn index_document(&self, index: &str, document: &Document) -> Result<IndexResponse> {
        let path = format!("/{}/_doc", index);

        let resp = self
            .client
            .post(self.url(&path))
            .json(document)
            .send()
            .with_context(|| format!("POST {} failed", path))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!("POST {} {}: {}", path, status, text));
        }

        let indexed = resp.json::<IndexResponse>().unwrap_or_else(|e| {
            warn!("Unreadable acknowledgement from {}: {}", path, e);
            IndexResponse::default()
        });

        debug!(
            "Indexed document {} into {}",
            indexed.id.as_deref().unwrap_or("<no id>"),
            index
        );
        Ok(indexed)
    }
}
