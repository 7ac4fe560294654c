//! Replay lookup by id with a small reader cache.

use std::{
    io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    loader::{SessionLoader, REPLAY_FILES},
    replay::{ReplayError, ReplayReader, ReplayResult},
};

/// Opens replays below a root directory and keeps recently built readers.
///
/// Readers are shared as `Arc`s; a cached entry is dropped once its TTL has
/// elapsed or any replay file on disk changed. Unavailable replays are never
/// cached so that late-arriving collections are picked up.
#[derive(Clone)]
pub struct ReplayStore {
    root: PathBuf,
    cache_ttl: Duration,
    cache: Option<Arc<Mutex<LruCache<String, CachedReader>>>>,
}

#[derive(Clone)]
struct CachedReader {
    reader: Arc<ReplayReader>,
    cached_at: Instant,
    file_mtimes: FileMtimes,
}

/// Modification times of [`REPLAY_FILES`], `None` for absent files.
type FileMtimes = [Option<SystemTime>; REPLAY_FILES.len()];

impl ReplayStore {
    /// A zero capacity or TTL disables caching.
    pub fn new(root: PathBuf, cache_capacity: usize, cache_ttl: Duration) -> Self {
        let cache = NonZeroUsize::new(cache_capacity)
            .filter(|_| !cache_ttl.is_zero())
            .map(|capacity| Arc::new(Mutex::new(LruCache::new(capacity))));
        Self {
            root,
            cache_ttl,
            cache,
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.lock().len())
    }

    pub fn invalidate(&self, replay_id: &str) {
        if let Some(cache) = &self.cache {
            cache.lock().pop(replay_id);
        }
    }

    /// Reader for `replay_id`, `Ok(None)` while any collection is missing.
    pub async fn open(&self, replay_id: &str) -> ReplayResult<Option<Arc<ReplayReader>>> {
        let replay_id = validate_replay_id(replay_id)?;
        let replay_dir = self.root.join(replay_id);

        match tokio::fs::metadata(&replay_dir).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(ReplayError::NotFound(replay_id.to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ReplayError::NotFound(replay_id.to_string()));
            }
            Err(err) => return Err(ReplayError::io(replay_dir, err)),
        }

        let file_mtimes = replay_file_mtimes(&replay_dir).await;

        if let Some(reader) = self.fetch_from_cache(replay_id, &file_mtimes) {
            debug!(replay_id, "replay reader cache hit");
            return Ok(Some(reader));
        }

        let Some(reader) = SessionLoader::new(replay_dir).load().await? else {
            return Ok(None);
        };
        let reader = Arc::new(reader);
        self.store_in_cache(replay_id, Arc::clone(&reader), file_mtimes);
        Ok(Some(reader))
    }

    fn fetch_from_cache(
        &self,
        replay_id: &str,
        file_mtimes: &FileMtimes,
    ) -> Option<Arc<ReplayReader>> {
        let cache = self.cache.as_ref()?;
        let mut guard = cache.lock();
        let entry = guard.get(replay_id)?;

        let expired = entry.cached_at.elapsed() > self.cache_ttl;
        let stale = entry.file_mtimes != *file_mtimes;
        if expired || stale {
            debug!(replay_id, expired, stale, "dropping cached replay reader");
            guard.pop(replay_id);
            return None;
        }
        Some(Arc::clone(&entry.reader))
    }

    fn store_in_cache(
        &self,
        replay_id: &str,
        reader: Arc<ReplayReader>,
        file_mtimes: FileMtimes,
    ) {
        if let Some(cache) = &self.cache {
            cache.lock().put(
                replay_id.to_string(),
                CachedReader {
                    reader,
                    cached_at: Instant::now(),
                    file_mtimes,
                },
            );
        }
    }
}

async fn replay_file_mtimes(replay_dir: &Path) -> FileMtimes {
    let mut mtimes = [None; REPLAY_FILES.len()];
    for (slot, name) in mtimes.iter_mut().zip(REPLAY_FILES) {
        *slot = tokio::fs::metadata(replay_dir.join(name))
            .await
            .ok()
            .and_then(|metadata| metadata.modified().ok());
    }
    mtimes
}

/// Replay ids name a directory directly below the root.
pub fn validate_replay_id(replay_id: &str) -> ReplayResult<&str> {
    let trimmed = replay_id.trim();
    let invalid = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\']);
    if invalid {
        return Err(ReplayError::InvalidId(replay_id.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn validate_replay_id__plain_id__then_trimmed() {
        assert_eq!(
            validate_replay_id("  761104e184c64d439ee1014b72b4d83b ").unwrap(),
            "761104e184c64d439ee1014b72b4d83b"
        );
    }

    #[test]
    fn validate_replay_id__path_like__then_rejected() {
        for id in ["", "   ", ".", "..", "../other", "a/b", "a\\b"] {
            let err = validate_replay_id(id).unwrap_err();
            assert!(matches!(err, ReplayError::InvalidId(_)), "{id:?}");
        }
    }

    #[test]
    fn new__zero_capacity_or_ttl__then_cache_disabled() {
        let root = PathBuf::from("/tmp");
        assert!(ReplayStore::new(root.clone(), 0, Duration::from_secs(60))
            .cache
            .is_none());
        assert!(ReplayStore::new(root.clone(), 8, Duration::ZERO)
            .cache
            .is_none());
        assert!(ReplayStore::new(root, 8, Duration::from_secs(60))
            .cache
            .is_some());
    }

    #[tokio::test]
    async fn open__unknown_replay__then_not_found() {
        let root = tempdir().unwrap();
        let store = ReplayStore::new(root.path().to_path_buf(), 4, Duration::from_secs(60));

        let err = store.open("missing").await.unwrap_err();
        assert!(matches!(err, ReplayError::NotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn open__file_instead_of_dir__then_not_found() {
        let root = tempdir().unwrap();
        std::fs::write(root.path().join("replay"), "x").unwrap();
        let store = ReplayStore::new(root.path().to_path_buf(), 4, Duration::from_secs(60));

        assert!(matches!(
            store.open("replay").await.unwrap_err(),
            ReplayError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn open__incomplete_replay__then_none_and_not_cached() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("partial")).unwrap();
        let store = ReplayStore::new(root.path().to_path_buf(), 4, Duration::from_secs(60));

        assert!(store.open("partial").await.unwrap().is_none());
        assert_eq!(store.cached_len(), 0);
    }
}
