// Wire shapes of the collections a replay is assembled from.
//
// Breadcrumb and span timestamps arrive in seconds, recorded events in
// milliseconds. Everything the reader hands out afterwards is in epoch
// milliseconds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::timestamps::TimeRange;

pub const RRWEB_EVENT_FULL_SNAPSHOT: u8 = 2;
pub const RRWEB_EVENT_INCREMENTAL_SNAPSHOT: u8 = 3;
pub const RRWEB_EVENT_CUSTOM: u8 = 5;

/// Root replay event, created at the start of the browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub count_errors: u64,
    #[serde(default)]
    pub count_segments: u64,
    #[serde(default)]
    pub urls: Vec<String>,
    /// Reconciled bounds at full precision, set once by the reader.
    #[serde(skip)]
    reconciled: Option<TimeRange>,
}

impl ReplayRecord {
    pub fn started_at_ms(&self) -> Option<f64> {
        match self.reconciled {
            Some(range) => Some(range.start_ms),
            None => self.started_at.map(|at| at.timestamp_millis() as f64),
        }
    }

    pub fn finished_at_ms(&self) -> Option<f64> {
        match self.reconciled {
            Some(range) => Some(range.end_ms),
            None => self.finished_at.map(|at| at.timestamp_millis() as f64),
        }
    }

    /// Range described by the record's own hints, if both are present.
    pub fn hinted_range(&self) -> Option<TimeRange> {
        let start = self.started_at_ms()?;
        let end = self.finished_at_ms()?;
        Some(TimeRange::new(start.min(end), start.max(end)))
    }

    /// Overwrite the timestamp hints with reconciled bounds.
    pub(crate) fn apply_time_range(&mut self, range: TimeRange) {
        self.started_at = datetime_from_ms(range.start_ms);
        self.finished_at = datetime_from_ms(range.end_ms);
        self.reconciled = Some(range);
    }
}

/// Epoch milliseconds to a UTC instant, keeping sub-millisecond digits.
fn datetime_from_ms(ms: f64) -> Option<DateTime<Utc>> {
    let secs = (ms / 1000.0).floor();
    let nanos = ((ms - secs * 1000.0) * 1_000_000.0).round() as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999))
}

/// One captured browser-state delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingEvent {
    #[serde(rename = "type")]
    pub kind: u8,
    /// Milliseconds. Events sent without a clock read as zero.
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub data: Value,
}

impl RecordingEvent {
    pub fn is_custom(&self) -> bool {
        self.kind == RRWEB_EVENT_CUSTOM
    }

    /// Tag of a custom event, e.g. `replay-end`.
    pub fn custom_tag(&self) -> Option<&str> {
        if !self.is_custom() {
            return None;
        }
        self.data.get("tag").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBreadcrumb {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSpan {
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub start_timestamp: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub end_timestamp: Option<f64>,
    #[serde(default)]
    pub data: Value,
}

/// An error event linked to the replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, rename = "error.type")]
    pub error_type: Vec<String>,
    #[serde(default, rename = "issue.id")]
    pub issue_id: Option<u64>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default, rename = "project.name")]
    pub project_name: Option<String>,
}

impl ErrorRecord {
    pub fn timestamp_ms(&self) -> Option<f64> {
        self.timestamp.map(|at| at.timestamp_millis() as f64)
    }
}

/// Coverage report attached to a replay, keyed by repository and file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageAttachment {
    pub repository: String,
    pub path: String,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub coverage: Value,
}

/// Seconds to milliseconds, dropping values that cannot be a real timestamp.
pub(crate) fn secs_to_ms(secs: Option<f64>) -> Option<f64> {
    secs.filter(|value| is_usable_timestamp(*value))
        .map(|value| value * 1000.0)
}

/// Zero, NaN and infinities never count as a clock reading.
pub(crate) fn is_usable_timestamp(value: f64) -> bool {
    value.is_finite() && value != 0.0
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use serde_json::json;

    #[test]
    fn replay_record__camel_case_payload__then_deserializes() {
        let record: ReplayRecord = serde_json::from_value(json!({
            "id": "761104e184c64d439ee1014b72b4d83b",
            "projectId": "6273278",
            "duration": 84.0,
            "tags": {"url": ["https://example.org/"], "browser.name": ["Chrome"]},
            "startedAt": "2022-09-20T19:04:47.108Z",
            "finishedAt": "2022-09-20T19:06:11.108Z",
            "countErrors": 2
        }))
        .unwrap();

        assert_eq!(record.project_id.as_deref(), Some("6273278"));
        assert_eq!(record.tags["url"], vec!["https://example.org/".to_string()]);
        assert_eq!(record.count_errors, 2);
        assert_eq!(record.started_at_ms(), Some(1_663_700_687_108.0));
        assert_eq!(record.count_segments, 0);
    }

    #[test]
    fn replay_record__hinted_range__then_orders_bounds() {
        let mut record: ReplayRecord =
            serde_json::from_value(json!({"id": "r", "duration": 1.0})).unwrap();
        assert!(record.hinted_range().is_none());

        record.apply_time_range(TimeRange::new(2_000.0, 5_000.0));
        let range = record.hinted_range().unwrap();
        assert_eq!(range.start_ms, 2_000.0);
        assert_eq!(range.end_ms, 5_000.0);
    }

    #[test]
    fn apply_time_range__sub_millisecond_bounds__then_kept_exactly() {
        let mut record: ReplayRecord =
            serde_json::from_value(json!({"id": "r", "duration": 1.0})).unwrap();
        let range = TimeRange::new(1_663_700_687.5012 * 1000.0, 1_663_700_690.0004 * 1000.0);

        record.apply_time_range(range);

        assert_eq!(record.started_at_ms(), Some(range.start_ms));
        assert_eq!(record.finished_at_ms(), Some(range.end_ms));
        let started_at = record.started_at.unwrap();
        assert_eq!(started_at.timestamp_millis(), 1_663_700_687_501);
        assert!((started_at.timestamp_subsec_nanos() as i64 - 501_200_000).abs() < 1_000);
    }

    #[test]
    fn recording_event__missing_timestamp__then_zero() {
        let event: RecordingEvent = serde_json::from_value(json!({"type": 3, "data": {}})).unwrap();
        assert_eq!(event.timestamp, 0.0);
        assert!(!is_usable_timestamp(event.timestamp));
    }

    #[test]
    fn recording_event__custom_tag__then_only_for_custom_events() {
        let end = RecordingEvent {
            kind: RRWEB_EVENT_CUSTOM,
            timestamp: 1.0,
            data: json!({"tag": "replay-end"}),
        };
        let snapshot = RecordingEvent {
            kind: RRWEB_EVENT_FULL_SNAPSHOT,
            timestamp: 1.0,
            data: json!({"tag": "replay-end"}),
        };

        assert_eq!(end.custom_tag(), Some("replay-end"));
        assert_eq!(snapshot.custom_tag(), None);
    }

    #[test]
    fn error_record__dotted_field_names__then_deserializes() {
        let error: ErrorRecord = serde_json::from_value(json!({
            "id": "1d50320db4a2423cb15e63b905ca69ea",
            "title": "Something bad happened.",
            "timestamp": "2022-09-20T19:05:00Z",
            "error.type": ["Error"],
            "issue.id": 42,
            "issue": "JAVASCRIPT-1",
            "project.name": "javascript"
        }))
        .unwrap();

        assert_eq!(error.error_type, vec!["Error".to_string()]);
        assert_eq!(error.issue_id, Some(42));
        assert_eq!(error.project_name.as_deref(), Some("javascript"));
        assert!(error.timestamp_ms().is_some());
    }

    #[test]
    fn secs_to_ms__unusable_values__then_dropped() {
        assert_eq!(secs_to_ms(Some(1.5)), Some(1500.0));
        assert_eq!(secs_to_ms(Some(0.0)), None);
        assert_eq!(secs_to_ms(Some(f64::NAN)), None);
        assert_eq!(secs_to_ms(Some(f64::INFINITY)), None);
        assert_eq!(secs_to_ms(None), None);
    }
}
