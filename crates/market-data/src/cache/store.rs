//! Two-tier key/value cache with per-read TTL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::persistent::PersistentStore;

struct MemoryEntry<T> {
    value: T,
    written_at: Instant,
}

/// Two-tier cache store: in-process memory plus an optional persistent
/// backend.
///
/// The TTL is supplied per read, so the same entry can be fresh for one
/// caller and stale for another - entries are never deleted, only ignored
/// once stale and overwritten by the next successful fetch. The memory
/// tier is unbounded; the key universe (symbols x operations) is small
/// and finite.
///
/// Reads consult memory first; on a miss the persistent tier is checked
/// and a fresh hit is promoted into memory, backdated by its on-disk age.
/// Writes go to both tiers synchronously; persistent-tier failures are
/// logged and swallowed.
pub struct CacheStore<T> {
    memory: Mutex<HashMap<String, MemoryEntry<T>>>,
    persistent: Option<Arc<dyn PersistentStore>>,
}

impl<T: Clone + Serialize + DeserializeOwned> CacheStore<T> {
    /// Create a memory-only cache (environments without durable storage).
    pub fn memory_only() -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            persistent: None,
        }
    }

    /// Create a cache backed by a persistent store.
    pub fn with_persistent(store: Arc<dyn PersistentStore>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            persistent: Some(store),
        }
    }

    /// Lock the memory tier, recovering from poison if necessary.
    ///
    /// Worst case after recovery is a stale or missing entry, which the
    /// TTL check already tolerates.
    fn lock_memory(&self) -> MutexGuard<'_, HashMap<String, MemoryEntry<T>>> {
        self.memory.lock().unwrap_or_else(|poisoned| {
            warn!("Cache memory mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Look up a value no older than `ttl`.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<T> {
        {
            let memory = self.lock_memory();
            if let Some(entry) = memory.get(key) {
                if entry.written_at.elapsed() <= ttl {
                    return Some(entry.value.clone());
                }
            }
        }

        let store = self.persistent.as_ref()?;

        match store.read(key) {
            Ok(Some(entry)) if entry.age <= ttl => {
                match serde_json::from_slice::<T>(&entry.bytes) {
                    Ok(value) => {
                        // Promote into memory, keeping the on-disk age so
                        // the TTL keeps counting from the original write.
                        let written_at = Instant::now()
                            .checked_sub(entry.age)
                            .unwrap_or_else(Instant::now);
                        let mut memory = self.lock_memory();
                        memory.insert(
                            key.to_string(),
                            MemoryEntry {
                                value: value.clone(),
                                written_at,
                            },
                        );
                        Some(value)
                    }
                    Err(e) => {
                        warn!("Persistent cache entry for '{}' is corrupt: {}", key, e);
                        None
                    }
                }
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Persistent cache read error for '{}': {}", key, e);
                None
            }
        }
    }

    /// Write a value to both tiers.
    pub fn set(&self, key: &str, value: &T) {
        {
            let mut memory = self.lock_memory();
            memory.insert(
                key.to_string(),
                MemoryEntry {
                    value: value.clone(),
                    written_at: Instant::now(),
                },
            );
        }

        if let Some(store) = &self.persistent {
            match serde_json::to_vec(value) {
                Ok(bytes) => {
                    if let Err(e) = store.write(key, &bytes) {
                        warn!("Persistent cache write error for '{}': {}", key, e);
                    }
                }
                Err(e) => warn!("Failed to serialize cache entry for '{}': {}", key, e),
            }
        }
    }

    /// Age a memory entry as if it had been written `age` ago.
    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &str, age: Duration) {
        let mut memory = self.lock_memory();
        if let Some(entry) = memory.get_mut(key) {
            entry.written_at = Instant::now()
                .checked_sub(age)
                .unwrap_or_else(Instant::now);
        }
    }
}
