//! Reads the collections of one replay from its directory.
//!
//! Layout of a replay directory:
//!
//! ```text
//! <replay_id>/
//!   record.json        replay record
//!   recording.json     recorded browser events
//!   breadcrumbs.json
//!   spans.json
//!   errors.json
//!   coverage.json      coverage attachments
//!   chunks.json        optional bundle chunk stats
//! ```
//!
//! A file that does not exist leaves its collection absent, which makes the
//! reader unavailable. A file that exists but cannot be read or decoded is an
//! error. Chunk statistics are resolved here, once, so the reader never
//! touches the disk.

use std::{io, path::PathBuf, sync::Arc};

use serde::de::DeserializeOwned;
use tokio::task;
use tracing::{debug, warn};

use crate::replay::{
    ChunkSource, CoverageAttachment, ErrorRecord, JsonChunkFile, RawBreadcrumb, RawSpan,
    RecordingEvent, ReplayError, ReplayReader, ReplayReaderParams, ReplayRecord, ReplayResult,
    WebpackChunk,
};

pub const RECORD_FILE: &str = "record.json";
pub const RECORDING_FILE: &str = "recording.json";
pub const BREADCRUMBS_FILE: &str = "breadcrumbs.json";
pub const SPANS_FILE: &str = "spans.json";
pub const ERRORS_FILE: &str = "errors.json";
pub const COVERAGE_FILE: &str = "coverage.json";
pub const CHUNKS_FILE: &str = "chunks.json";

/// Every file a reader is built from.
pub const REPLAY_FILES: [&str; 7] = [
    RECORD_FILE,
    RECORDING_FILE,
    BREADCRUMBS_FILE,
    SPANS_FILE,
    ERRORS_FILE,
    COVERAGE_FILE,
    CHUNKS_FILE,
];

#[derive(Debug, Clone)]
pub struct SessionLoader {
    dir: PathBuf,
    chunk_source: Option<Arc<dyn ChunkSource>>,
}

impl SessionLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            chunk_source: None,
        }
    }

    /// Use `source` for chunk statistics instead of `chunks.json`.
    pub fn with_chunk_source(mut self, source: Arc<dyn ChunkSource>) -> Self {
        self.chunk_source = Some(source);
        self
    }

    /// Fetch every collection concurrently.
    pub async fn load_params(&self) -> ReplayResult<ReplayReaderParams> {
        let (replay_record, rrweb_events, breadcrumbs, spans, errors, coverage) = tokio::try_join!(
            read_collection::<ReplayRecord>(self.dir.join(RECORD_FILE)),
            read_collection::<Vec<RecordingEvent>>(self.dir.join(RECORDING_FILE)),
            read_collection::<Vec<RawBreadcrumb>>(self.dir.join(BREADCRUMBS_FILE)),
            read_collection::<Vec<RawSpan>>(self.dir.join(SPANS_FILE)),
            read_collection::<Vec<ErrorRecord>>(self.dir.join(ERRORS_FILE)),
            read_collection::<Vec<CoverageAttachment>>(self.dir.join(COVERAGE_FILE)),
        )?;

        let webpack_chunks = self.load_chunks().await?;

        Ok(ReplayReaderParams {
            breadcrumbs,
            coverage,
            errors,
            replay_record,
            rrweb_events,
            spans,
            webpack_chunks,
        })
    }

    async fn load_chunks(&self) -> ReplayResult<Vec<WebpackChunk>> {
        let source = match &self.chunk_source {
            Some(source) => Arc::clone(source),
            None => {
                let path = self.dir.join(CHUNKS_FILE);
                let exists = tokio::fs::try_exists(&path)
                    .await
                    .map_err(|err| ReplayError::io(&path, err))?;
                if !exists {
                    return Ok(Vec::new());
                }
                Arc::new(JsonChunkFile::new(path))
            }
        };

        debug!(?source, "loading chunk statistics");
        task::spawn_blocking(move || source.load()).await?
    }

    /// Load and build the reader; `Ok(None)` when a collection is missing.
    pub async fn load(&self) -> ReplayResult<Option<ReplayReader>> {
        let params = self.load_params().await?;
        let missing = params.missing();
        if !missing.is_empty() {
            warn!(
                dir = %self.dir.display(),
                ?missing,
                "Replay is missing collections, reader unavailable"
            );
        }
        Ok(ReplayReader::create(params))
    }
}

async fn read_collection<T>(path: PathBuf) -> ReplayResult<Option<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "collection not present");
            return Ok(None);
        }
        Err(err) => return Err(ReplayError::io(path, err)),
    };

    let value = task::spawn_blocking(move || {
        serde_json::from_slice::<T>(&bytes).map_err(|err| ReplayError::parse(&path, err))
    })
    .await??;
    Ok(Some(value))
}
