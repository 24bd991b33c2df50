use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time cache statistics for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats<K> {
    /// Live entries, including expired ones not yet swept
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage of lookups that hit, 0 when nothing was looked up
    pub hit_rate: f64,
    pub expirations: u64,
    pub evictions: u64,
    pub average_access_count: f64,
    /// Most accessed keys, highest first
    pub top_keys: Vec<K>,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    }
}
