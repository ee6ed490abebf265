//! Cache configuration.
//!
//! Selects the reply feed cache backend via the `[cache]` section.

use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::Deserialize;

const DEFAULT_NAMESPACE: &str = "replyfeed";
const DEFAULT_MEMORY_CAPACITY: usize = 1024;

/// Storage used for cached reply feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Bounded in-process LRU.
    #[default]
    Memory,
    /// Shared Redis instance; entries expire server-side.
    Redis,
    /// Every read misses.
    Disabled,
}

impl CacheBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(format!(
                "unknown cache backend `{other}` (expected memory, redis or disabled)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Prefix shared by every key this deployment writes.
    pub namespace: String,
    /// Maximum entries held by the memory backend.
    pub memory_capacity: usize,
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            redis_url: None,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            namespace: settings.namespace.clone(),
            memory_capacity: settings.memory_capacity,
            redis_url: settings.redis_url.clone(),
        }
    }
}

impl CacheConfig {
    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
