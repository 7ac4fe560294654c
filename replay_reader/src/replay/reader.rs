// Replay reader facade: the single gate that turns fetched collections into
// one reconciled, read-only view.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::attachments::CoverageRepo;
use super::breadcrumbs::{breadcrumb_factory, Breadcrumb};
use super::chunks::WebpackChunk;
use super::events::rrweb_event_list_factory;
use super::spans::{self, as_memory, spans_factory, MemorySpan, Span};
use super::tags;
use super::timestamps::{replay_timestamps, TimeRange};
use super::types::{
    CoverageAttachment, ErrorRecord, RawBreadcrumb, RawSpan, RecordingEvent, ReplayRecord,
};

/// The collections a reader is built from. Each one is fetched separately and
/// stays `None` until it has arrived.
#[derive(Default, Clone)]
pub struct ReplayReaderParams {
    pub breadcrumbs: Option<Vec<RawBreadcrumb>>,
    pub coverage: Option<Vec<CoverageAttachment>>,
    pub errors: Option<Vec<ErrorRecord>>,
    pub replay_record: Option<ReplayRecord>,
    pub rrweb_events: Option<Vec<RecordingEvent>>,
    pub spans: Option<Vec<RawSpan>>,
    /// Chunk statistics resolved by the caller. Not required for construction.
    pub webpack_chunks: Vec<WebpackChunk>,
}

impl ReplayReaderParams {
    /// Names of the required collections that have not arrived.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.breadcrumbs.is_none() {
            missing.push("breadcrumbs");
        }
        if self.coverage.is_none() {
            missing.push("coverage");
        }
        if self.errors.is_none() {
            missing.push("errors");
        }
        if self.replay_record.is_none() {
            missing.push("replay_record");
        }
        if self.rrweb_events.is_none() {
            missing.push("rrweb_events");
        }
        if self.spans.is_none() {
            missing.push("spans");
        }
        missing
    }
}

impl fmt::Debug for ReplayReaderParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayReaderParams")
            .field("missing", &self.missing())
            .field("webpack_chunks", &self.webpack_chunks.len())
            .finish()
    }
}

/// Read-only view of one replay session.
///
/// Everything is computed once in [`ReplayReader::create`]; accessors only
/// hand out what was computed there.
pub struct ReplayReader {
    replay_record: ReplayRecord,
    rrweb_events: Vec<RecordingEvent>,
    breadcrumbs: Vec<Breadcrumb>,
    spans: Vec<Span>,
    coverage_repo: CoverageRepo,
    time_range: TimeRange,
    webpack_chunks: Vec<WebpackChunk>,
}

impl ReplayReader {
    /// Build a reader, or `None` if any required collection is missing.
    pub fn create(params: ReplayReaderParams) -> Option<Self> {
        let missing = params.missing();
        let ReplayReaderParams {
            breadcrumbs: Some(breadcrumbs),
            coverage: Some(coverage),
            errors: Some(errors),
            replay_record: Some(mut replay_record),
            rrweb_events: Some(rrweb_events),
            spans: Some(raw_spans),
            webpack_chunks,
        } = params
        else {
            debug!(?missing, "replay collections incomplete, reader unavailable");
            return None;
        };

        // Backend timestamps are unreliable, the collections are the source of truth.
        let time_range = replay_timestamps(&rrweb_events, &breadcrumbs, &raw_spans)
            .or_else(|| replay_record.hinted_range())
            .unwrap_or_else(TimeRange::empty);
        replay_record.apply_time_range(time_range);

        let spans = spans_factory(raw_spans);
        let breadcrumbs = breadcrumb_factory(&replay_record, &errors, breadcrumbs, &spans);
        let rrweb_events = rrweb_event_list_factory(time_range, rrweb_events);
        let coverage_repo = CoverageRepo::new(coverage);

        debug!(
            replay_id = %replay_record.id,
            start_ms = time_range.start_ms,
            end_ms = time_range.end_ms,
            events = rrweb_events.len(),
            breadcrumbs = breadcrumbs.len(),
            spans = spans.len(),
            "replay reader ready"
        );

        Some(Self {
            replay_record,
            rrweb_events,
            breadcrumbs,
            spans,
            coverage_repo,
            time_range,
            webpack_chunks,
        })
    }

    /// Duration of the replay in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.replay_record.duration * 1000.0
    }

    pub fn replay(&self) -> &ReplayRecord {
        &self.replay_record
    }

    pub fn rrweb_events(&self) -> &[RecordingEvent] {
        &self.rrweb_events
    }

    pub fn raw_crumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    pub fn raw_spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn coverage_repo(&self) -> &CoverageRepo {
        &self.coverage_repo
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn is_memory_span(&self, span: &Span) -> bool {
        spans::is_memory_span(span)
    }

    pub fn is_network_span(&self, span: &Span) -> bool {
        spans::is_network_span(span)
    }

    pub fn memory_spans(&self) -> impl Iterator<Item = MemorySpan<'_>> {
        self.spans.iter().filter_map(as_memory)
    }

    pub fn network_spans(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(|span| spans::is_network_span(span))
    }

    pub fn error_count(&self) -> usize {
        self.breadcrumbs.iter().filter(|crumb| crumb.is_error()).count()
    }

    /// Record tags minus the keys that map to structured fields.
    pub fn custom_tags(&self) -> BTreeMap<&str, &[String]> {
        tags::custom_tags(&self.replay_record.tags)
    }

    /// Chunk statistics handed in at construction, empty without any.
    pub fn webpack_stats(&self) -> &[WebpackChunk] {
        &self.webpack_chunks
    }
}

impl fmt::Debug for ReplayReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayReader")
            .field("replay_id", &self.replay_record.id)
            .field("time_range", &self.time_range)
            .field("rrweb_events", &self.rrweb_events.len())
            .field("breadcrumbs", &self.breadcrumbs.len())
            .field("spans", &self.spans.len())
            .field("coverage_files", &self.coverage_repo.len())
            .finish_non_exhaustive()
    }
}
