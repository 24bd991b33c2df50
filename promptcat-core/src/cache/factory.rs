//! Cache construction from configuration
//!
//! Two entry points with deliberately different failure behavior:
//!
//! - [`CacheFactory::build`] is for explicit calls and refuses anything it
//!   cannot honor exactly.
//! - [`CacheFactory::build_best_effort`] is for ambient configuration read at
//!   startup. A reserved-but-unimplemented provider degrades to `local`
//!   instead of stopping a long-running process.

use std::hash::Hash;
use std::str::FromStr;
use tracing::{info, warn};

use super::store::{CacheOptions, LocalCache};
use crate::config::CacheConfig;
use crate::error::CacheError;

/// Known cache backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheProvider {
    /// In-process [`LocalCache`]
    Local,
    /// Reserved for a networked backend; accepted but not implemented
    Redis,
}

impl CacheProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheProvider::Local => "local",
            CacheProvider::Redis => "redis",
        }
    }
}

impl FromStr for CacheProvider {
    type Err = CacheError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" | "memory" => Ok(CacheProvider::Local),
            "redis" => Ok(CacheProvider::Redis),
            _ => Err(CacheError::UnsupportedProvider {
                provider: raw.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds caches from [`CacheConfig`]
pub struct CacheFactory;

impl CacheFactory {
    /// Strict construction: unimplemented or unknown providers are errors
    pub fn build<K, V>(config: &CacheConfig) -> Result<LocalCache<K, V>, CacheError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        match config.provider.parse::<CacheProvider>()? {
            CacheProvider::Local => {
                if config.max_size == 0 {
                    return Err(CacheError::InvalidConfig(
                        "max_size must be at least 1".to_string(),
                    ));
                }
                Ok(Self::build_local(config, config.max_size))
            }
            CacheProvider::Redis => Err(CacheError::NotImplemented {
                provider: CacheProvider::Redis.to_string(),
            }),
        }
    }

    /// Best-effort construction for ambient configuration
    ///
    /// `redis` falls back to `local` keeping `max_size` and `ttl`; a zero
    /// capacity falls back to the default capacity. Unknown providers are
    /// still rejected so a misspelled backend is never silently accepted.
    pub fn build_best_effort<K, V>(config: &CacheConfig) -> Result<LocalCache<K, V>, CacheError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let provider = config.provider.parse::<CacheProvider>()?;
        if provider == CacheProvider::Redis {
            warn!(
                "Cache provider '{}' is not yet implemented, falling back to 'local'",
                provider
            );
        }

        let max_size = if config.max_size == 0 {
            let fallback = CacheConfig::default().max_size;
            warn!("Cache max_size of 0 is unusable, falling back to {}", fallback);
            fallback
        } else {
            config.max_size
        };

        Ok(Self::build_local(config, max_size))
    }

    /// Best-effort construction from `PROMPTCAT_CACHE_*` variables
    pub fn from_env<K, V>() -> Result<LocalCache<K, V>, CacheError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        Self::build_best_effort(&CacheConfig::from_env())
    }

    fn build_local<K, V>(config: &CacheConfig, max_size: usize) -> LocalCache<K, V>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        info!(
            "Building local cache (max_size: {}, ttl: {:?})",
            max_size,
            config.ttl()
        );
        LocalCache::new(CacheOptions {
            max_size,
            default_ttl: config.ttl(),
            cleanup_interval: config.cleanup_interval(),
        })
    }
}
