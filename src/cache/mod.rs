//! Reply feed cache.
//!
//! A small get / put-if-absent contract ([`TtlCache`]) with per-entry expiry,
//! an in-process LRU backend and a disabled backend. Callers treat every
//! cache failure as a miss, so correctness never depends on the cache.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "memory"   # memory | redis | disabled
//! namespace = "replyfeed"
//! memory_capacity = 1024
//! # redis_url = "redis://127.0.0.1/"
//! ```

mod config;
mod keys;
pub(crate) mod lock;
pub mod policy;
mod store;

pub use config::{CacheBackend, CacheConfig};
pub use keys::CacheKeys;
pub use store::{CacheError, DisabledCache, MemoryTtlCache, TtlCache};
