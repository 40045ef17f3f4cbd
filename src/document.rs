//! Row → document mapping
//!
//! Pure: the ingestion time is passed in so the same row always maps to the same document.

use crate::analytics::report::ReportRow;
use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// Flat JSON object written as one Elasticsearch document.
pub type Document = Map<String, Value>;

/// Metric values arrive as strings. Missing or empty means zero.
pub fn parse_metric_value(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| anyhow!("metric value {:?} is not a number", raw))?;
    if !value.is_finite() {
        return Err(anyhow!("metric value {:?} is not finite", raw));
    }
    Ok(value)
}

pub fn build_document(
    dimension_headers: &[String],
    metric_headers: &[String],
    row: &ReportRow,
    ingested_at: DateTime<Utc>,
) -> Result<Document> {
    let mut doc = Document::new();

    for (name, value) in dimension_headers.iter().zip(&row.dimension_values) {
        doc.insert(name.clone(), Value::String(value.clone()));
    }

    for (i, name) in metric_headers.iter().enumerate() {
        let raw = row.metric_values.get(i).map(String::as_str).unwrap_or("");
        let value = parse_metric_value(raw).map_err(|e| e.context(format!("metric {}", name)))?;
        // parse_metric_value only yields finite values
        let number = Number::from_f64(value).ok_or_else(|| anyhow!("metric {} out of range", name))?;
        doc.insert(name.clone(), Value::Number(number));
    }

    doc.insert(
        TIMESTAMP_FIELD.to_string(),
        Value::String(ingested_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(dims: &[&str], metrics: &[&str]) -> ReportRow {
        ReportRow {
            dimension_values: headers(dims),
            metric_values: headers(metrics),
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_document_field_set() {
        let doc = build_document(
            &headers(&["date", "pagePath"]),
            &headers(&["screenPageViews", "sessions"]),
            &row(&["2024-01-01", "/home"], &["12", "3"]),
            fixed_time(),
        )
        .unwrap();

        assert_eq!(
            Value::Object(doc),
            json!({
                "date": "2024-01-01",
                "pagePath": "/home",
                "screenPageViews": 12.0,
                "sessions": 3.0,
                "@timestamp": "2024-01-02T03:04:05.000000Z"
            })
        );
    }

    #[test]
    fn test_metrics_are_floats() {
        let doc = build_document(
            &headers(&["date"]),
            &headers(&["sessions"]),
            &row(&["2024-01-01"], &["7"]),
            fixed_time(),
        )
        .unwrap();

        assert!(doc["sessions"].is_f64());
        assert_eq!(serde_json::to_string(&doc["sessions"]).unwrap(), "7.0");
    }

    #[test]
    fn test_empty_and_missing_metrics_are_zero() {
        let doc = build_document(
            &headers(&["date"]),
            &headers(&["screenPageViews", "sessions"]),
            &row(&["2024-01-01"], &[""]),
            fixed_time(),
        )
        .unwrap();

        assert_eq!(doc["screenPageViews"], json!(0.0));
        assert_eq!(doc["sessions"], json!(0.0));
    }

    #[test]
    fn test_non_numeric_metric_is_error() {
        let err = build_document(
            &headers(&["date"]),
            &headers(&["sessions"]),
            &row(&["2024-01-01"], &["lots"]),
            fixed_time(),
        )
        .unwrap_err();

        let msg = format!("{:#}", err);
        assert!(msg.contains("sessions"));
        assert!(msg.contains("lots"));
    }

    #[test]
    fn test_parse_metric_value() {
        assert_eq!(parse_metric_value("").unwrap(), 0.0);
        assert_eq!(parse_metric_value("  ").unwrap(), 0.0);
        assert_eq!(parse_metric_value("42").unwrap(), 42.0);
        assert_eq!(parse_metric_value("0.125").unwrap(), 0.125);
        assert!(parse_metric_value("NaN").is_err());
        assert!(parse_metric_value("inf").is_err());
    }

    #[test]
    fn test_same_input_same_document() {
        let dims = headers(&["date", "pagePath"]);
        let metrics = headers(&["screenPageViews", "sessions"]);
        let r = row(&["2024-01-01", "/docs"], &["5", "2"]);

        let a = build_document(&dims, &metrics, &r, fixed_time()).unwrap();
        let b = build_document(&dims, &metrics, &r, fixed_time()).unwrap();
        assert_eq!(a, b);
    }
}
