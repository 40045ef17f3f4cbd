//! Google Analytics Data API (GA4) integration
//!
//! Service-account authentication and the single `runReport` call the export needs.

pub mod client;
pub mod credentials;
pub mod report;
pub mod token;

pub use client::AnalyticsClient;
pub use credentials::ServiceAccountKey;
pub use report::{DateWindow, Report, ReportQuery, ReportRow};
