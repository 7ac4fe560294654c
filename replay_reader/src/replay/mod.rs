// Replay reconstruction: reconciles recorded events, breadcrumbs, spans and
// error records of one session into a single read-only view.

pub mod attachments;
pub mod breadcrumbs;
pub mod chunks;
pub mod error;
pub mod events;
pub mod reader;
pub mod spans;
pub mod tags;
pub mod timestamps;
pub mod types;

// Re-export main types
pub use attachments::CoverageRepo;
pub use breadcrumbs::{Breadcrumb, BreadcrumbLevel, BreadcrumbType, CrumbSource};
pub use chunks::{ChunkModule, ChunkSource, JsonChunkFile, StaticChunks, WebpackChunk};
pub use error::{ReplayError, ReplayResult};
pub use reader::{ReplayReader, ReplayReaderParams};
pub use spans::{MemoryInfo, MemorySpan, Span, SpanCategory};
pub use timestamps::TimeRange;
pub use types::{
    CoverageAttachment, ErrorRecord, RawBreadcrumb, RawSpan, RecordingEvent, ReplayRecord,
    RRWEB_EVENT_CUSTOM,
};
