// Session bounds from sources whose clocks may disagree or be missing.

use serde::{Deserialize, Serialize};

use super::types::{is_usable_timestamp, secs_to_ms, RawBreadcrumb, RawSpan, RecordingEvent};

/// Largest-contentful-paint spans report the render of an earlier page and
/// would drag the start of the session backwards.
const LCP_OP: &str = "largest-contentful-paint";

/// Inclusive `[start_ms, end_ms]` window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl TimeRange {
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        debug_assert!(start_ms <= end_ms);
        Self { start_ms, end_ms }
    }

    pub fn empty() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn contains(&self, timestamp_ms: f64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }

    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    fn widen(range: Option<Self>, start_ms: f64, end_ms: f64) -> Option<Self> {
        Some(match range {
            None => Self::new(start_ms, end_ms),
            Some(range) => Self::new(range.start_ms.min(start_ms), range.end_ms.max(end_ms)),
        })
    }
}

/// Earliest start and latest end across recorded events, breadcrumbs and spans.
///
/// Sources without a usable timestamp do not contribute. Returns `None` when
/// nothing contributed at all.
pub fn replay_timestamps(
    events: &[RecordingEvent],
    crumbs: &[RawBreadcrumb],
    spans: &[RawSpan],
) -> Option<TimeRange> {
    let mut range = None;

    for ts in events
        .iter()
        .map(|event| event.timestamp)
        .filter(|ts| is_usable_timestamp(*ts))
    {
        range = TimeRange::widen(range, ts, ts);
    }

    for ts in crumbs.iter().filter_map(|crumb| secs_to_ms(crumb.timestamp)) {
        range = TimeRange::widen(range, ts, ts);
    }

    for span in spans.iter().filter(|span| span.op.as_deref() != Some(LCP_OP)) {
        let start = secs_to_ms(span.start_timestamp);
        let end = secs_to_ms(span.end_timestamp);
        match (start, end) {
            (Some(start), Some(end)) => {
                range = TimeRange::widen(range, start.min(end), start.max(end));
            }
            (Some(ts), None) | (None, Some(ts)) => {
                range = TimeRange::widen(range, ts, ts);
            }
            (None, None) => {}
        }
    }

    range
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use serde_json::Value;

    fn event(ts: f64) -> RecordingEvent {
        RecordingEvent {
            kind: 3,
            timestamp: ts,
            data: Value::Null,
        }
    }

    fn crumb(secs: Option<f64>) -> RawBreadcrumb {
        RawBreadcrumb {
            kind: None,
            category: Some("ui.click".to_string()),
            level: None,
            message: None,
            timestamp: secs,
            data: Value::Null,
        }
    }

    fn span(op: &str, start: Option<f64>, end: Option<f64>) -> RawSpan {
        RawSpan {
            op: Some(op.to_string()),
            description: None,
            start_timestamp: start,
            end_timestamp: end,
            data: Value::Null,
        }
    }

    #[test]
    fn replay_timestamps__all_sources__then_earliest_start_latest_end() {
        let range = replay_timestamps(
            &[event(10_000.0), event(12_000.0)],
            &[crumb(Some(9.5))],
            &[span("resource.fetch", Some(11.0), Some(13.25))],
        )
        .unwrap();

        assert_eq!(range.start_ms, 9_500.0);
        assert_eq!(range.end_ms, 13_250.0);
    }

    #[test]
    fn replay_timestamps__missing_timestamps__then_not_treated_as_zero() {
        let range = replay_timestamps(
            &[event(0.0), event(5_000.0)],
            &[crumb(None)],
            &[span("resource.fetch", None, Some(6.0))],
        )
        .unwrap();

        assert_eq!(range.start_ms, 5_000.0);
        assert_eq!(range.end_ms, 6_000.0);
    }

    #[test]
    fn replay_timestamps__lcp_span__then_ignored() {
        let range = replay_timestamps(
            &[event(5_000.0)],
            &[],
            &[span(LCP_OP, Some(1.0), Some(1.0))],
        )
        .unwrap();

        assert_eq!(range.start_ms, 5_000.0);
        assert_eq!(range.end_ms, 5_000.0);
    }

    #[test]
    fn replay_timestamps__no_inputs__then_none() {
        assert!(replay_timestamps(&[], &[], &[]).is_none());
        assert!(replay_timestamps(&[event(0.0)], &[crumb(None)], &[]).is_none());
    }

    #[test]
    fn replay_timestamps__inverted_span__then_range_still_ordered() {
        let range =
            replay_timestamps(&[], &[], &[span("navigation.navigate", Some(8.0), Some(7.0))])
                .unwrap();

        assert!(range.start_ms <= range.end_ms);
        assert!(range.contains(7_000.0));
        assert!(range.contains(8_000.0));
    }

    #[test]
    fn time_range__contains_and_duration__then_inclusive() {
        let range = TimeRange::new(100.0, 300.0);
        assert!(range.contains(100.0));
        assert!(range.contains(300.0));
        assert!(!range.contains(300.5));
        assert_eq!(range.duration_ms(), 200.0);
        assert_eq!(TimeRange::empty().duration_ms(), 0.0);
    }
}
