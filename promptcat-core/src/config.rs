//! promptcat configuration types
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. Explicit config file passed by the host (`promptcat.yaml`)
//! 2. `PROMPTCAT_CACHE_*` environment variables (cache section only, via
//!    [`CacheConfig::from_env`])
//! 3. Built-in defaults
//!
//! ## File Syntax
//!
//! ```yaml
//! cache:
//!   provider: local
//!   max_size: 1000
//!   ttl_ms: 300000
//!   cleanup_interval_ms: 60000
//! catalog:
//!   content_root: ./prompts
//!   scan_cache_ttl_ms: 5000
//!   scan_cache_max_size: 512
//! ```
//!
//! The catalog's directory listing cache takes its backend from
//! `cache.provider` and its sizing from the `catalog` section.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable selecting the cache provider
pub const ENV_CACHE_PROVIDER: &str = "PROMPTCAT_CACHE_PROVIDER";
/// Environment variable for the cache capacity
pub const ENV_CACHE_MAX_SIZE: &str = "PROMPTCAT_CACHE_MAX_SIZE";
/// Environment variable for the default entry TTL in milliseconds
pub const ENV_CACHE_TTL_MS: &str = "PROMPTCAT_CACHE_TTL_MS";
/// Environment variable for the sweep interval in milliseconds
pub const ENV_CACHE_CLEANUP_INTERVAL_MS: &str = "PROMPTCAT_CACHE_CLEANUP_INTERVAL_MS";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptcatConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl PromptcatConfig {
    /// Load configuration from a file, or defaults if the file is absent
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Parse configuration from YAML (JSON is valid YAML too)
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Invalid promptcat config YAML")
    }
}

/// Cache engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Which backend to build ("local" today, "redis" reserved)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Maximum number of live entries before eviction
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Default TTL applied when `set` is called without one.
    /// `None` means entries only leave by eviction or explicit delete.
    #[serde(default)]
    pub ttl_ms: Option<u64>,

    /// Interval for the optional background sweep
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            max_size: default_max_size(),
            ttl_ms: None,
            cleanup_interval_ms: default_cleanup_interval_ms(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_max_size() -> usize {
    1000
}

fn default_cleanup_interval_ms() -> Option<u64> {
    Some(60_000)
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }

    pub fn cleanup_interval(&self) -> Option<Duration> {
        self.cleanup_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Build from process environment, falling back to defaults per field
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    ///
    /// Malformed numbers are logged and ignored rather than rejected, so a
    /// typo in the environment never prevents startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(provider) = lookup(ENV_CACHE_PROVIDER) {
            let provider = provider.trim();
            if !provider.is_empty() {
                config.provider = provider.to_string();
            }
        }

        if let Some(max_size) = parse_number::<usize>(&lookup, ENV_CACHE_MAX_SIZE) {
            config.max_size = max_size;
        }

        if let Some(ttl_ms) = parse_number::<u64>(&lookup, ENV_CACHE_TTL_MS) {
            config.ttl_ms = Some(ttl_ms);
        }

        if let Some(interval_ms) = parse_number::<u64>(&lookup, ENV_CACHE_CLEANUP_INTERVAL_MS) {
            config.cleanup_interval_ms = Some(interval_ms);
        }

        config
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring malformed {}='{}', using default", key, raw);
            None
        }
    }
}

/// Catalog loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Content tree to load when the host does not pass one explicitly
    #[serde(default)]
    pub content_root: Option<PathBuf>,

    /// How long a memoized directory listing stays valid
    #[serde(default = "default_scan_cache_ttl_ms")]
    pub scan_cache_ttl_ms: u64,

    /// Capacity of the directory listing cache
    #[serde(default = "default_scan_cache_max_size")]
    pub scan_cache_max_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            content_root: None,
            scan_cache_ttl_ms: default_scan_cache_ttl_ms(),
            scan_cache_max_size: default_scan_cache_max_size(),
        }
    }
}

fn default_scan_cache_ttl_ms() -> u64 {
    5_000
}

fn default_scan_cache_max_size() -> usize {
    512
}

impl CatalogConfig {
    pub fn scan_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.scan_cache_ttl_ms)
    }

    /// Cache settings for the directory listing cache
    ///
    /// The backend comes from `cache.provider`; capacity, entry TTL and the
    /// sweep interval come from this section.
    pub fn listing_cache_config(&self, cache: &CacheConfig) -> CacheConfig {
        CacheConfig {
            provider: cache.provider.clone(),
            max_size: self.scan_cache_max_size,
            ttl_ms: Some(self.scan_cache_ttl_ms),
            cleanup_interval_ms: Some(self.scan_cache_ttl_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PromptcatConfig::default();
        assert_eq!(config.cache.provider, "local");
        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.cache.ttl(), None);
        assert_eq!(
            config.cache.cleanup_interval(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(config.catalog.scan_cache_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = PromptcatConfig::from_yaml("cache:\n  max_size: 5\n").unwrap();
        assert_eq!(config.cache.max_size, 5);
        assert_eq!(config.cache.provider, "local");
        assert_eq!(config.catalog.scan_cache_max_size, 512);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = PromptcatConfig::load_from_path(temp_dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.cache.max_size, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("promptcat.yaml");
        std::fs::write(
            &path,
            "cache:\n  provider: redis\n  ttl_ms: 250\ncatalog:\n  content_root: /srv/prompts\n",
        )
        .unwrap();

        let config = PromptcatConfig::load_from_path(&path).unwrap();
        assert_eq!(config.cache.provider, "redis");
        assert_eq!(config.cache.ttl(), Some(Duration::from_millis(250)));
        assert_eq!(
            config.catalog.content_root,
            Some(PathBuf::from("/srv/prompts"))
        );
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let result = PromptcatConfig::from_yaml("cache: [not, a, map]");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_reads_all_fields() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            (ENV_CACHE_PROVIDER, " redis "),
            (ENV_CACHE_MAX_SIZE, "42"),
            (ENV_CACHE_TTL_MS, "1500"),
            (ENV_CACHE_CLEANUP_INTERVAL_MS, "0"),
        ]));

        assert_eq!(config.provider, "redis");
        assert_eq!(config.max_size, 42);
        assert_eq!(config.ttl(), Some(Duration::from_millis(1500)));
        // Zero disables the sweep
        assert_eq!(config.cleanup_interval(), None);
    }

    #[test]
    fn test_from_lookup_ignores_malformed_numbers() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            (ENV_CACHE_MAX_SIZE, "lots"),
            (ENV_CACHE_TTL_MS, "-5"),
        ]));

        assert_eq!(config.max_size, 1000);
        assert_eq!(config.ttl_ms, None);
    }

    #[test]
    fn test_listing_cache_config_uses_catalog_sizing() {
        let config = PromptcatConfig::from_yaml(
            "cache:\n  provider: redis\n  max_size: 99\n  ttl_ms: 1\ncatalog:\n  scan_cache_ttl_ms: 250\n  scan_cache_max_size: 8\n",
        )
        .unwrap();

        let listing = config.catalog.listing_cache_config(&config.cache);
        assert_eq!(listing.provider, "redis");
        assert_eq!(listing.max_size, 8);
        assert_eq!(listing.ttl(), Some(Duration::from_millis(250)));
        assert_eq!(listing.cleanup_interval(), Some(Duration::from_millis(250)));
    }
}
