// Span normalization and classification into memory, network and other.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{secs_to_ms, RawSpan};

pub const MEMORY_OP: &str = "memory";
const PAINT_MARKER: &str = "paint";

/// Span ops that are surfaced as navigation breadcrumbs.
pub const NAVIGATION_OPS: [&str; 3] = [
    "navigation.navigate",
    "navigation.reload",
    "navigation.back_forward",
];
pub const PAGE_LOAD_OP: &str = "navigation.navigate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanCategory {
    Memory,
    Network,
    /// Paint and UI spans, plus spans without an op.
    Other,
}

impl SpanCategory {
    pub fn classify(op: Option<&str>) -> Self {
        match op {
            None => SpanCategory::Other,
            Some(MEMORY_OP) => SpanCategory::Memory,
            Some(op) if op.contains(PAINT_MARKER) => SpanCategory::Other,
            Some(_) => SpanCategory::Network,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpanCategory::Memory => "memory",
            SpanCategory::Network => "network",
            SpanCategory::Other => "other",
        }
    }
}

impl fmt::Display for SpanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized span, timestamps in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub id: String,
    pub op: Option<String>,
    pub description: Option<String>,
    pub start_timestamp_ms: Option<f64>,
    pub end_timestamp_ms: Option<f64>,
    pub category: SpanCategory,
    #[serde(default)]
    pub data: Value,
}

impl Span {
    pub fn from_raw(raw: RawSpan) -> Self {
        let start = secs_to_ms(raw.start_timestamp);
        let end = secs_to_ms(raw.end_timestamp);
        let label = raw
            .description
            .as_deref()
            .or(raw.op.as_deref())
            .unwrap_or_default();
        let id = format!(
            "{label}-{}-{}",
            raw.start_timestamp.unwrap_or_default(),
            raw.end_timestamp.unwrap_or_default()
        );

        Span {
            id,
            category: SpanCategory::classify(raw.op.as_deref()),
            op: raw.op,
            description: raw.description,
            start_timestamp_ms: start,
            end_timestamp_ms: end,
            data: raw.data,
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.op
            .as_deref()
            .is_some_and(|op| NAVIGATION_OPS.contains(&op))
    }

    pub fn duration_ms(&self) -> Option<f64> {
        Some(self.end_timestamp_ms? - self.start_timestamp_ms?)
    }
}

pub fn is_memory_span(span: &Span) -> bool {
    span.category == SpanCategory::Memory
}

pub fn is_network_span(span: &Span) -> bool {
    span.category == SpanCategory::Network
}

/// Heap figures carried by a memory span.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoryInfo {
    #[serde(default, rename = "jsHeapSizeLimit")]
    pub js_heap_size_limit: u64,
    #[serde(default, rename = "totalJSHeapSize")]
    pub total_js_heap_size: u64,
    #[serde(default, rename = "usedJSHeapSize")]
    pub used_js_heap_size: u64,
}

/// A span known to be a memory sample.
#[derive(Debug, Clone, Copy)]
pub struct MemorySpan<'a> {
    pub span: &'a Span,
    pub memory: MemoryInfo,
}

/// Narrow a span to a memory sample. Missing or malformed heap data reads as zero.
pub fn as_memory(span: &Span) -> Option<MemorySpan<'_>> {
    if !is_memory_span(span) {
        return None;
    }
    let memory = span
        .data
        .get("memory")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();
    Some(MemorySpan { span, memory })
}

/// Normalize raw spans and order them by start time.
pub fn spans_factory(raw: Vec<RawSpan>) -> Vec<Span> {
    let mut spans: Vec<Span> = raw.into_iter().map(Span::from_raw).collect();
    spans.sort_by(|a, b| {
        a.start_timestamp_ms
            .unwrap_or_default()
            .total_cmp(&b.start_timestamp_ms.unwrap_or_default())
    });
    spans
}
