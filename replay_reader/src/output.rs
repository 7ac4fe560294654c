//! Output formatters for replay summaries and timelines
//!
//! Supports text and JSON output formats.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::replay::{Breadcrumb, ReplayReader, SpanCategory};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format '{}'. Use 'text' or 'json'", s)),
        }
    }
}

/// Header figures of one replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub replay_id: String,
    pub project_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: f64,
    pub event_count: usize,
    pub breadcrumb_count: usize,
    pub error_count: usize,
    pub span_counts: BTreeMap<SpanCategory, usize>,
    pub coverage_files: usize,
    pub tags: BTreeMap<String, Vec<String>>,
}

impl ReplaySummary {
    pub fn from_reader(reader: &ReplayReader) -> Self {
        let record = reader.replay();
        let mut span_counts = BTreeMap::new();
        for span in reader.raw_spans() {
            *span_counts.entry(span.category).or_insert(0) += 1;
        }

        Self {
            replay_id: record.id.clone(),
            project_id: record.project_id.clone(),
            started_at: record.started_at,
            finished_at: record.finished_at,
            duration_ms: reader.duration_ms(),
            event_count: reader.rrweb_events().len(),
            breadcrumb_count: reader.raw_crumbs().len(),
            error_count: reader.error_count(),
            span_counts,
            coverage_files: reader.coverage_repo().len(),
            tags: reader
                .custom_tags()
                .into_iter()
                .map(|(key, values)| (key.to_string(), values.to_vec()))
                .collect(),
        }
    }

    fn span_count(&self, category: SpanCategory) -> usize {
        self.span_counts.get(&category).copied().unwrap_or(0)
    }
}

/// Format replay summary
pub fn format_summary(summary: &ReplaySummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_summary_text(summary),
        OutputFormat::Json => {
            serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

fn format_summary_text(summary: &ReplaySummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("Replay:   {}\n", summary.replay_id));
    if let Some(ref project_id) = summary.project_id {
        output.push_str(&format!("Project:  {}\n", project_id));
    }
    if let Some(started_at) = summary.started_at {
        output.push_str(&format!("Started:  {}\n", started_at.to_rfc3339()));
    }
    output.push_str(&format!("Duration: {}\n", format_duration(summary.duration_ms)));
    output.push_str(&format!("Events:   {:>6}\n", summary.event_count));
    output.push_str(&format!(
        "Crumbs:   {:>6} ({} errors)\n",
        summary.breadcrumb_count, summary.error_count
    ));
    output.push_str(&format!(
        "Spans:    {} memory, {} network, {} other\n",
        summary.span_count(SpanCategory::Memory),
        summary.span_count(SpanCategory::Network),
        summary.span_count(SpanCategory::Other),
    ));
    output.push_str(&format!("Coverage: {} files\n", summary.coverage_files));

    if !summary.tags.is_empty() {
        output.push('\n');
        for (key, values) in &summary.tags {
            output.push_str(&format!("{}: {}\n", key, values.join(", ")));
        }
    }

    output
}

/// Format breadcrumb timeline, offsets relative to `start_ms`
pub fn format_timeline(crumbs: &[Breadcrumb], start_ms: f64, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for crumb in crumbs {
                let kind = serde_json::to_value(crumb.kind)
                    .ok()
                    .and_then(|value| value.as_str().map(str::to_string))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "{:>10}  {:<10} {:<12} {}\n",
                    format_offset(crumb.timestamp_ms - start_ms),
                    kind,
                    crumb.category.as_deref().unwrap_or("-"),
                    crumb.message.as_deref().unwrap_or(""),
                ));
            }
            output
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(crumbs).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

/// Whole seconds, at least one, e.g. `1m 24s`.
pub fn format_duration(duration_ms: f64) -> String {
    let secs = ((duration_ms / 1000.0).floor() as u64).max(1);
    let (hours, rest) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m {seconds}s"),
        _ => format!("{hours}h {minutes}m {seconds}s"),
    }
}

/// `mm:ss.mmm`, negative offsets clamp to zero.
fn format_offset(offset_ms: f64) -> String {
    let total = offset_ms.max(0.0).round() as u64;
    let (minutes, rest) = (total / 60_000, total % 60_000);
    format!("{:02}:{:02}.{:03}", minutes, rest / 1000, rest % 1000)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::replay::{BreadcrumbLevel, BreadcrumbType, CrumbSource};
    use serde_json::Value;

    fn summary() -> ReplaySummary {
        let mut span_counts = BTreeMap::new();
        span_counts.insert(SpanCategory::Memory, 2);
        span_counts.insert(SpanCategory::Network, 5);
        let mut tags = BTreeMap::new();
        tags.insert("url".to_string(), vec!["/a".to_string(), "/b".to_string()]);
        ReplaySummary {
            replay_id: "abc".to_string(),
            project_id: Some("42".to_string()),
            started_at: DateTime::<Utc>::from_timestamp_millis(0),
            finished_at: DateTime::<Utc>::from_timestamp_millis(84_000),
            duration_ms: 84_000.0,
            event_count: 120,
            breadcrumb_count: 9,
            error_count: 1,
            span_counts,
            coverage_files: 0,
            tags,
        }
    }

    #[test]
    fn output_format__from_str__then_case_insensitive() {
        assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().unwrap_err().contains("yaml"));
    }

    #[test]
    fn format_summary__text__then_lists_counts_and_tags() {
        let text = format_summary(&summary(), OutputFormat::Text);
        assert!(text.contains("Replay:   abc"));
        assert!(text.contains("Duration: 1m 24s"));
        assert!(text.contains("(1 errors)"));
        assert!(text.contains("2 memory, 5 network, 0 other"));
        assert!(text.contains("url: /a, /b"));
    }

    #[test]
    fn format_summary__json__then_round_trips_fields() {
        let json = format_summary(&summary(), OutputFormat::Json);
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["replay_id"], "abc");
        assert_eq!(value["span_counts"]["network"], 5);
        assert_eq!(value["duration_ms"], 84_000.0);
    }

    #[test]
    fn format_duration__sub_second__then_one_second() {
        assert_eq!(format_duration(0.0), "1s");
        assert_eq!(format_duration(999.0), "1s");
        assert_eq!(format_duration(59_999.0), "59s");
        assert_eq!(format_duration(3_723_000.0), "1h 2m 3s");
    }

    #[test]
    fn format_timeline__text__then_offsets_from_start() {
        let crumbs = vec![Breadcrumb {
            id: 0,
            kind: BreadcrumbType::Error,
            level: BreadcrumbLevel::Error,
            category: Some("issue".to_string()),
            message: Some("TypeError".to_string()),
            timestamp_ms: 61_250.0,
            data: Value::Null,
            source: CrumbSource::Error,
        }];

        let text = format_timeline(&crumbs, 0.0, OutputFormat::Text);
        assert!(text.contains("01:01.250"));
        assert!(text.contains("error"));
        assert!(text.contains("issue"));
        assert!(text.contains("TypeError"));
    }

    #[test]
    fn format_offset__negative__then_zero() {
        assert_eq!(format_offset(-5.0), "00:00.000");
    }
}
