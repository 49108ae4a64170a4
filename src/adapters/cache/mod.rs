//! In-memory TTL cache shared by the upstream clients

mod ttl_cache;

pub use ttl_cache::{CacheEntry, CacheStats, SharedCache, TtlCache};
