// Bundle chunk statistics shown next to a replay.
//
// The data always comes from an injected source. The loader resolves it once
// and the reader only holds the result.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::{ReplayError, ReplayResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkModule {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebpackChunk {
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modules: Vec<ChunkModule>,
}

pub trait ChunkSource: fmt::Debug + Send + Sync {
    fn load(&self) -> ReplayResult<Vec<WebpackChunk>>;
}

/// Chunks held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticChunks(pub Vec<WebpackChunk>);

impl ChunkSource for StaticChunks {
    fn load(&self) -> ReplayResult<Vec<WebpackChunk>> {
        Ok(self.0.clone())
    }
}

/// Chunks read from a webpack stats JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonChunkFile {
    path: PathBuf,
}

impl JsonChunkFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChunkSource for JsonChunkFile {
    fn load(&self) -> ReplayResult<Vec<WebpackChunk>> {
        let raw = fs::read_to_string(&self.path).map_err(|err| ReplayError::io(&self.path, err))?;
        let chunks: Vec<WebpackChunk> =
            serde_json::from_str(&raw).map_err(|err| ReplayError::parse(&self.path, err))?;
        if let Some(pos) = chunks.iter().position(|chunk| chunk.id.is_empty()) {
            return Err(ReplayError::chunks(format!(
                "chunk #{pos} in {} has an empty id",
                self.path.display()
            )));
        }
        Ok(chunks)
    }
}
