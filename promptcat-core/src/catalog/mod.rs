//! Catalog - loading, publishing and querying template items
//!
//! # Overview
//!
//! A [`CatalogService`] owns exactly one published [`Generation`]. Loading
//! builds a complete new generation off to the side and publishes it with a
//! single atomic pointer swap, so readers only ever see the whole previous
//! catalog or the whole new one.
//!
//! # Architecture
//!
//! ```text
//! content root
//!     │
//!     ├── scanner    ← directory listings memoized in the cache engine
//!     ├── validator  ← per-document classification
//!     ├── registry   ← deprecation / group / visibility overrides
//!     └── compiler   ← per-generation template environment + arg schemas
//!            │
//!            ▼
//!     Generation (immutable) ──ArcSwap::store──► readers
//! ```
//!
//! Loads are serialized: a `load` or `reload` that arrives while another is
//! running is rejected with [`CatalogError::ReloadInProgress`].

mod compiler;
mod generation;
mod loader;
mod query;
mod report;
mod scanner;

pub use compiler::{build_argument_schema, item_template_name, CompiledItem};
pub use generation::Generation;
pub use query::{CatalogStats, ListFilter};
pub use report::{LoadError, LoadErrorKind, LoadReport, LoadWarning};
pub use scanner::{EntryKind, ListingCache, ListingEntry, PARTIALS_DIR};

use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::cache::{CacheFactory, CacheOptions, CacheStats, LocalCache};
use crate::config::{CatalogConfig, PromptcatConfig};
use crate::error::{CacheError, CatalogError, RenderError};
use crate::item::{ItemRuntime, RuntimeState};
use crate::repository::Repository;

/// The catalog: one published generation plus the machinery to replace it
pub struct CatalogService {
    config: CatalogConfig,
    published: ArcSwap<Generation>,
    listings: ListingCache,
    load_gate: tokio::sync::Mutex<()>,
}

impl CatalogService {
    /// Service with a listing cache sized from the catalog config
    pub fn new(config: CatalogConfig) -> Self {
        let listings = LocalCache::new(CacheOptions {
            max_size: config.scan_cache_max_size,
            default_ttl: Some(config.scan_cache_ttl()),
            cleanup_interval: Some(config.scan_cache_ttl()),
        });
        Self::with_cache(config, listings)
    }

    /// Service over a host-built listing cache
    ///
    /// Starts the cache's periodic sweep when a tokio runtime is available.
    pub fn with_cache(config: CatalogConfig, listings: ListingCache) -> Self {
        if listings.start_cleanup() {
            info!("Started listing cache cleanup");
        }
        Self {
            config,
            published: ArcSwap::from_pointee(Generation::empty()),
            listings,
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Service built from full configuration, cache via the best-effort factory
    ///
    /// See [`CatalogConfig::listing_cache_config`] for which section sizes
    /// the listing cache.
    pub fn from_config(config: &PromptcatConfig) -> Result<Self, CacheError> {
        let cache_config = config.catalog.listing_cache_config(&config.cache);
        let listings = CacheFactory::build_best_effort(&cache_config)?;
        Ok(Self::with_cache(config.catalog.clone(), listings))
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Build and publish a new generation from `content_root`
    #[instrument(skip(self), fields(root = %content_root.display()))]
    pub async fn load(&self, content_root: &Path) -> Result<LoadReport, CatalogError> {
        let _guard = self
            .load_gate
            .try_lock()
            .map_err(|_| CatalogError::ReloadInProgress)?;
        self.run_cycle(content_root).await
    }

    /// Drop memoized listings under `content_root`, then load
    #[instrument(skip(self), fields(root = %content_root.display()))]
    pub async fn reload(&self, content_root: &Path) -> Result<LoadReport, CatalogError> {
        let _guard = self
            .load_gate
            .try_lock()
            .map_err(|_| CatalogError::ReloadInProgress)?;

        let root = resolve_root(content_root).await?;
        let invalidated = self.listings.invalidate_where(|key| key.starts_with(&root));
        info!("Invalidated {} cached listings under {}", invalidated, root.display());

        self.run_cycle(&root).await
    }

    /// Sync the repository, then reload from its local path
    ///
    /// A sync failure surfaces as [`CatalogError::Sync`] and leaves the
    /// published generation untouched.
    pub async fn sync_and_reload(
        &self,
        repository: &dyn Repository,
    ) -> Result<LoadReport, CatalogError> {
        if let Err(e) = repository.sync().await {
            let error = CatalogError::from(e);
            error.log();
            return Err(error);
        }
        self.reload(repository.local_path()).await
    }

    async fn run_cycle(&self, content_root: &Path) -> Result<LoadReport, CatalogError> {
        let result = async {
            let root = resolve_root(content_root).await?;
            let number = self.published.load().number() + 1;
            loader::build_generation(
                &root,
                number,
                &self.listings,
                self.config.scan_cache_ttl(),
            )
            .await
        }
        .await;

        match result {
            Ok((generation, report)) => {
                self.published.store(Arc::new(generation));
                info!(
                    "Published catalog generation {} ({} items)",
                    report.generation, report.compiled_count
                );
                Ok(report)
            }
            Err(e) => {
                e.log();
                Err(e)
            }
        }
    }

    /// The currently published generation
    pub fn snapshot(&self) -> Arc<Generation> {
        self.published.load_full()
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<CompiledItem>> {
        self.published.load().get(id).cloned()
    }

    /// Runtime records matching `filter`, in scan order
    pub fn list(&self, filter: &ListFilter) -> Vec<ItemRuntime> {
        self.published
            .load()
            .items()
            .filter(|item| filter.matches(&item.runtime))
            .map(|item| item.runtime.clone())
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        self.published.load().stats()
    }

    /// Render an item from the published generation
    pub fn render(&self, id: &str, args: &Map<String, Value>) -> Result<String, RenderError> {
        let item = self.get_by_id(id).ok_or_else(|| RenderError::NotFound {
            id: id.to_string(),
        })?;
        if item.runtime.runtime_state == RuntimeState::Disabled {
            return Err(RenderError::Disabled { id: id.to_string() });
        }
        item.render(args)
    }

    /// Statistics of the directory listing cache
    pub fn cache_stats(&self) -> CacheStats<PathBuf> {
        self.listings.stats()
    }

    /// Stop background work; the published generation stays readable
    pub fn close(&self) {
        self.listings.destroy();
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("generation", &self.published.load().number())
            .field("listings", &self.listings)
            .finish_non_exhaustive()
    }
}

async fn resolve_root(content_root: &Path) -> Result<PathBuf, CatalogError> {
    tokio::fs::canonicalize(content_root)
        .await
        .map_err(|source| CatalogError::ContentRoot {
            path: content_root.to_path_buf(),
            source,
        })
}
