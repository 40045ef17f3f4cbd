//! Elasticsearch destination

pub mod client;

pub use client::{ClusterInfo, IndexResponse, SearchClient};

/// Index every export run writes into.
pub const EXPORT_INDEX: &str = "ga4-data";
