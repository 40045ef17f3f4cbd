//! GA4 Export Library
//!
//! Pulls a trailing window of Google Analytics 4 report rows and loads them,
//! one document per row, into an Elasticsearch index.
//! The binary in main.rs is a thin wrapper around [`pipeline::run_from_env`].

pub mod analytics;
pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod search;

pub use config::ExportConfig;
pub use error::ExportError;
pub use pipeline::{ExportSummary, HttpConnector};
