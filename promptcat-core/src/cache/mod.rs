//! In-process cache engine
//!
//! A bounded key/value store with TTL expiry and hybrid eviction, used by the
//! catalog loader to memoize directory listings.
//!
//! # Eviction
//!
//! Eviction only happens when a *new* key is inserted into a full cache. The
//! victim is the entry with the fewest recorded accesses; among equally
//! accessed entries the least recently touched one goes first.
//!
//! # Expiry
//!
//! TTL is enforced lazily on `get`/`has`, and optionally by a periodic sweep
//! started with [`LocalCache::start_cleanup`].
//!
//! # Construction
//!
//! ```text
//! CacheConfig ──► CacheFactory::build              (strict: errors on redis/unknown)
//!             └─► CacheFactory::build_best_effort  (ambient: redis falls back to local)
//! ```

mod entry;
mod factory;
mod stats;
mod store;

pub use factory::{CacheFactory, CacheProvider};
pub use stats::CacheStats;
pub use store::{CacheOptions, LocalCache};

/// Number of keys reported in [`CacheStats::top_keys`]
pub const TOP_KEYS_LIMIT: usize = 10;

#[cfg(test)]
mod tests;
