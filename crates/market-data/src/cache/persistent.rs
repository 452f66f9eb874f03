//! Persistent tier of the cache store.
//!
//! A small storage capability behind a trait so environments without
//! durable local storage can simply run memory-only. The filesystem
//! implementation keeps one file per cache key (hex-encoded so arbitrary
//! keys are filesystem-safe) and uses the file's mtime as the entry's
//! write time.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// A payload read back from the persistent tier, with its on-disk age.
#[derive(Debug)]
pub struct PersistedEntry {
    pub bytes: Vec<u8>,
    /// Time elapsed since the entry was written.
    pub age: Duration,
}

/// Storage capability for the persistent cache tier.
///
/// Implementations must be safe to call from concurrent tasks. Failures
/// are reported to the cache store, which logs and swallows them -
/// durability is best-effort, never a correctness dependency.
pub trait PersistentStore: Send + Sync {
    /// Read the entry for a key, or `None` if it was never written.
    fn read(&self, key: &str) -> io::Result<Option<PersistedEntry>>;

    /// Write (or replace) the entry for a key.
    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Filesystem-backed persistent store.
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key)))
    }
}

impl PersistentStore for FsStore {
    fn read(&self, key: &str) -> io::Result<Option<PersistedEntry>> {
        let path = self.path_for(key);

        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let age = metadata
            .modified()
            .map(|mtime| {
                SystemTime::now()
                    .duration_since(mtime)
                    .unwrap_or(Duration::ZERO)
            })
            .unwrap_or(Duration::ZERO);

        let bytes = fs::read(&path)?;

        Ok(Some(PersistedEntry { bytes, age }))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::write(self.path_for(key), bytes)
    }
}
