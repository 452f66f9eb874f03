//! Two-tier caching for aggregated market data.
//!
//! - Tier 1: in-process memory, a plain map with write timestamps
//! - Tier 2: optional persistent backend behind the [`PersistentStore`]
//!   capability (filesystem implementation provided)
//!
//! Caching here is an optimization, never a correctness dependency: every
//! persistent-tier failure is logged and swallowed, and a cache without a
//! persistent backend is fully functional.

mod persistent;
mod store;

pub use persistent::{FsStore, PersistedEntry, PersistentStore};
pub use store::CacheStore;
