//! Report query and result types
//!
//! `ReportQuery` is what the export asks for; `RunReportRequest` and
//! `RunReportResponse` mirror the Data API v1beta JSON; `Report` is the
//! header + row set handed to the loader.

use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Dimensions pulled by every export, in column order.
pub const DIMENSIONS: [&str; 2] = ["date", "pagePath"];
/// Metrics pulled by every export, in column order.
pub const METRICS: [&str; 2] = ["screenPageViews", "sessions"];

const PROPERTY_PREFIX: &str = "properties/";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar-day range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("date range start {} is after end {}", start, end);
        }
        Ok(Self { start, end })
    }

    /// `[today - days, today]`
    pub fn trailing(days: u32, today: NaiveDate) -> Result<Self> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .with_context(|| format!("cannot go back {} days from {}", days, today))?;
        Self::new(start, today)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub property_id: String,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub date_range: DateWindow,
    pub limit: u64,
}

impl ReportQuery {
    /// The export's fixed dimensions and metrics over the trailing `days` window ending `today`.
    pub fn trailing_window(
        property_id: &str,
        days: u32,
        limit: u64,
        today: NaiveDate,
    ) -> Result<Self> {
        if limit == 0 {
            bail!("report row limit must be positive");
        }
        Ok(Self {
            property_id: property_id
                .trim()
                .trim_start_matches(PROPERTY_PREFIX)
                .to_string(),
            dimensions: DIMENSIONS.iter().map(|d| d.to_string()).collect(),
            metrics: METRICS.iter().map(|m| m.to_string()).collect(),
            date_range: DateWindow::trailing(days, today)?,
            limit,
        })
    }

    /// Resource name, e.g. `properties/123456`.
    pub fn property(&self) -> String {
        format!("{}{}", PROPERTY_PREFIX, self.property_id)
    }

    pub fn to_request(&self) -> RunReportRequest {
        RunReportRequest {
            dimensions: self.dimensions.iter().map(|d| NamedField::new(d)).collect(),
            metrics: self.metrics.iter().map(|m| NamedField::new(m)).collect(),
            date_ranges: vec![WireDateRange {
                start_date: self.date_range.start.format(DATE_FORMAT).to_string(),
                end_date: self.date_range.end.format(DATE_FORMAT).to_string(),
            }],
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
}

impl NamedField {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    pub dimensions: Vec<NamedField>,
    pub metrics: Vec<NamedField>,
    pub date_ranges: Vec<WireDateRange>,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<NamedField>,
    #[serde(default)]
    pub metric_headers: Vec<MetricHeader>,
    #[serde(default)]
    pub rows: Vec<WireRow>,
    #[serde(default)]
    pub row_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricHeader {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRow {
    #[serde(default)]
    pub dimension_values: Vec<WireValue>,
    #[serde(default)]
    pub metric_values: Vec<WireValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireValue {
    #[serde(default)]
    pub value: Option<String>,
}

/// One result record: values positionally aligned with the report headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub dimension_values: Vec<String>,
    /// Raw metric strings as returned; empty when the API omitted the value.
    pub metric_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub dimension_headers: Vec<String>,
    pub metric_headers: Vec<String>,
    pub rows: Vec<ReportRow>,
    /// Total matching rows reported by the API, which may exceed `rows.len()` when the limit truncated.
    pub total_rows: Option<i64>,
}

impl Report {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<RunReportResponse> for Report {
    fn from(resp: RunReportResponse) -> Self {
        let unwrap_values = |values: Vec<WireValue>| -> Vec<String> {
            values
                .into_iter()
                .map(|v| v.value.unwrap_or_default())
                .collect()
        };

        Self {
            dimension_headers: resp.dimension_headers.into_iter().map(|h| h.name).collect(),
            metric_headers: resp.metric_headers.into_iter().map(|h| h.name).collect(),
            rows: resp
                .rows
                .into_iter()
                .map(|row| ReportRow {
                    dimension_values: unwrap_values(row.dimension_values),
                    metric_values: unwrap_values(row.metric_values),
                })
                .collect(),
            total_rows: resp.row_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_trailing_window_bounds() {
        let today = date("2024-03-15");
        for days in [1u32, 7, 30, 365] {
            let window = DateWindow::trailing(days, today).unwrap();
            assert_eq!(window.end(), today);
            assert_eq!((today - window.start()).num_days(), i64::from(days));
        }
    }

    #[test]
    fn test_trailing_window_crosses_leap_day() {
        let window = DateWindow::trailing(1, date("2024-03-01")).unwrap();
        assert_eq!(window.start(), date("2024-02-29"));
    }

    #[test]
    fn test_trailing_window_overflow_is_error() {
        assert!(DateWindow::trailing(u32::MAX, date("2024-01-01")).is_err());
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        assert!(DateWindow::new(date("2024-02-02"), date("2024-02-01")).is_err());
        assert!(DateWindow::new(date("2024-02-01"), date("2024-02-01")).is_ok());
    }

    #[test]
    fn test_query_uses_fixed_dimensions_and_metrics() {
        let query =
            ReportQuery::trailing_window("properties/987", 30, 100_000, date("2024-01-31")).unwrap();
        assert_eq!(query.property(), "properties/987");
        assert_eq!(query.dimensions, vec!["date", "pagePath"]);
        assert_eq!(query.metrics, vec!["screenPageViews", "sessions"]);
        assert_eq!(query.date_range.start(), date("2024-01-01"));
        assert_eq!(query.limit, 100_000);
    }

    #[test]
    fn test_query_rejects_zero_limit() {
        assert!(ReportQuery::trailing_window("1", 30, 0, date("2024-01-31")).is_err());
    }

    #[test]
    fn test_request_wire_shape() {
        let query = ReportQuery::trailing_window("42", 2, 500, date("2024-05-03")).unwrap();
        let body = serde_json::to_value(query.to_request()).unwrap();
        assert_eq!(
            body,
            json!({
                "dimensions": [{"name": "date"}, {"name": "pagePath"}],
                "metrics": [{"name": "screenPageViews"}, {"name": "sessions"}],
                "dateRanges": [{"startDate": "2024-05-01", "endDate": "2024-05-03"}],
                "limit": 500
            })
        );
    }

    #[test]
    fn test_response_into_report() {
        let resp: RunReportResponse = serde_json::from_value(json!({
            "dimensionHeaders": [{"name": "date"}, {"name": "pagePath"}],
            "metricHeaders": [
                {"name": "screenPageViews", "type": "TYPE_INTEGER"},
                {"name": "sessions", "type": "TYPE_INTEGER"}
            ],
            "rows": [
                {
                    "dimensionValues": [{"value": "20240101"}, {"value": "/home"}],
                    "metricValues": [{"value": "12"}, {}]
                }
            ],
            "rowCount": 1,
            "kind": "analyticsData#runReport"
        }))
        .unwrap();

        let report = Report::from(resp);
        assert_eq!(report.dimension_headers, vec!["date", "pagePath"]);
        assert_eq!(report.metric_headers, vec!["screenPageViews", "sessions"]);
        assert_eq!(report.total_rows, Some(1));
        assert_eq!(
            report.rows,
            vec![ReportRow {
                dimension_values: vec!["20240101".into(), "/home".into()],
                metric_values: vec!["12".into(), String::new()],
            }]
        );
    }

    #[test]
    fn test_empty_response_has_no_rows() {
        let resp: RunReportResponse =
            serde_json::from_str(r#"{"kind": "analyticsData#runReport"}"#).unwrap();
        let report = Report::from(resp);
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
    }
}
