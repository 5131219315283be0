//! The cached library catalog.
//!
//! [`LibraryIndex`] owns the catalog behind a single `RwLock`. Readers test
//! freshness under the shared lock and copy the catalog out; a stale cache is
//! rebuilt under the exclusive lock after testing freshness again, so callers
//! racing on the same stale cache trigger one traversal between them.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LibrarySettings;

use super::error::LibraryError;
use super::extract::extract_song;
use super::model::Song;
use super::walk::{FsWalker, ScanOptions, TreeWalker};

/// Cache lifetime used when the configured one is not positive.
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 5;

/// Monotonic time source used for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Default)]
struct Catalog {
    songs: Vec<Song>,
    by_id: HashMap<String, usize>,
}

#[derive(Debug, Default)]
struct CacheState {
    catalog: Catalog,
    last_scan: Option<Instant>,
    last_scan_at: Option<SystemTime>,
    last_dir_mtime: Option<SystemTime>,
}

/// Point-in-time view of the index, for health and status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatus {
    pub root: PathBuf,
    pub song_count: usize,
    pub last_scanned_at: Option<SystemTime>,
    pub cache_ttl: Duration,
    pub root_accessible: bool,
}

pub struct LibraryIndex {
    root: PathBuf,
    options: ScanOptions,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    walker: Arc<dyn TreeWalker>,
    state: RwLock<CacheState>,
}

impl LibraryIndex {
    /// Create an empty index for `settings.directory`. Nothing is scanned
    /// until the first call to [`catalog`](Self::catalog) or
    /// [`refresh`](Self::refresh).
    pub fn new(settings: &LibrarySettings) -> Self {
        let root = std::path::absolute(&settings.directory)
            .unwrap_or_else(|_| settings.directory.clone());
        let minutes = if settings.cache_ttl_minutes > 0 {
            settings.cache_ttl_minutes
        } else {
            DEFAULT_CACHE_TTL_MINUTES
        };

        Self {
            root,
            options: ScanOptions::from_settings(settings),
            ttl: Duration::from_secs((minutes as u64).saturating_mul(60)),
            clock: Arc::new(SystemClock),
            walker: Arc::new(FsWalker),
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_walker(mut self, walker: Arc<dyn TreeWalker>) -> Self {
        self.walker = walker;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Copy of the catalog, rebuilt first if the cache is stale.
    pub fn catalog(&self) -> Result<Vec<Song>, LibraryError> {
        self.catalog_with_cancel(&CancellationToken::new())
    }

    pub fn catalog_with_cancel(&self, cancel: &CancellationToken) -> Result<Vec<Song>, LibraryError> {
        // Stat outside the lock. If the root is unreachable, a cache that is
        // otherwise fresh is still served.
        let root_stat = self.stat_root();
        let dir_mtime = root_stat.as_ref().ok().copied().flatten();
        let root_ok = root_stat.is_ok();

        {
            let state = self.read_state();
            if self.is_fresh(&state, dir_mtime, root_ok) {
                debug!(count = state.catalog.songs.len(), "serving cached catalog");
                return Ok(state.catalog.songs.clone());
            }
        }

        let mut state = self.write_state();
        if self.is_fresh(&state, dir_mtime, root_ok) {
            return Ok(state.catalog.songs.clone());
        }

        let dir_mtime = root_stat.map_err(|source| self.unavailable(source))?;
        self.rebuild(&mut state, dir_mtime, cancel)?;
        Ok(state.catalog.songs.clone())
    }

    /// Rebuild unconditionally. On failure the previous catalog stays.
    pub fn refresh(&self) -> Result<(), LibraryError> {
        self.refresh_with_cancel(&CancellationToken::new())
    }

    pub fn refresh_with_cancel(&self, cancel: &CancellationToken) -> Result<(), LibraryError> {
        let dir_mtime = self.stat_root().map_err(|source| self.unavailable(source))?;
        let mut state = self.write_state();
        self.rebuild(&mut state, dir_mtime, cancel)
    }

    /// Look up a song in the cached catalog. Never triggers a scan.
    pub fn song(&self, id: &str) -> Option<Song> {
        let state = self.read_state();
        state
            .catalog
            .by_id
            .get(id)
            .and_then(|&i| state.catalog.songs.get(i))
            .cloned()
    }

    /// Number of songs in the cached catalog. Never triggers a scan.
    pub fn count(&self) -> usize {
        self.read_state().catalog.songs.len()
    }

    pub fn status(&self) -> IndexStatus {
        let root_accessible = self.stat_root().is_ok();
        let state = self.read_state();
        IndexStatus {
            root: self.root.clone(),
            song_count: state.catalog.songs.len(),
            last_scanned_at: state.last_scan_at,
            cache_ttl: self.ttl,
            root_accessible,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        // State is only ever replaced whole, so a poisoned lock still guards
        // a consistent value.
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Modification time of the root directory, `None` if the platform does
    /// not report one.
    fn stat_root(&self) -> io::Result<Option<SystemTime>> {
        let meta = std::fs::metadata(&self.root)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                "music path is not a directory",
            ));
        }
        Ok(meta.modified().ok())
    }

    fn unavailable(&self, source: io::Error) -> LibraryError {
        LibraryError::DirectoryUnavailable {
            path: self.root.clone(),
            source,
        }
    }

    /// A cache is servable iff it is non-empty, younger than the TTL and the
    /// root has not been modified since the last scan. An unreachable root
    /// cannot be compared and does not invalidate the cache on its own.
    fn is_fresh(&self, state: &CacheState, dir_mtime: Option<SystemTime>, root_ok: bool) -> bool {
        if state.catalog.songs.is_empty() {
            return false;
        }
        let Some(last_scan) = state.last_scan else {
            return false;
        };
        if self.clock.now().saturating_duration_since(last_scan) >= self.ttl {
            return false;
        }
        if !root_ok {
            return true;
        }
        match (dir_mtime, state.last_dir_mtime) {
            (Some(current), Some(seen)) => current <= seen,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    fn rebuild(
        &self,
        state: &mut CacheState,
        dir_mtime: Option<SystemTime>,
        cancel: &CancellationToken,
    ) -> Result<(), LibraryError> {
        let started = Instant::now();
        info!(root = %self.root.display(), "scanning music library");

        let mut songs: Vec<Song> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let walked = self.walker.walk(&self.root, &self.options, cancel, &mut |file| {
            let song = extract_song(&file.path, file.size);
            by_id.insert(song.id.clone(), songs.len());
            songs.push(song);
        });

        if let Err(err) = walked {
            warn!(root = %self.root.display(), error = %err, "library scan aborted, keeping previous catalog");
            return Err(err);
        }

        let count = songs.len();
        *state = CacheState {
            catalog: Catalog { songs, by_id },
            last_scan: Some(self.clock.now()),
            last_scan_at: Some(SystemTime::now()),
            last_dir_mtime: dir_mtime,
        };

        info!(
            count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "library scan finished"
        );
        Ok(())
    }
}
