//! Error types with clear, actionable messages
//!
//! Per-item problems found while loading a catalog are not errors at this
//! level: they are collected into [`crate::catalog::LoadReport`]. The enums
//! here cover whole-cycle failures, cache construction and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Cache construction errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Provider is recognised but has no backend yet
    #[error("Cache provider '{provider}' is not yet implemented.\n\nUse provider 'local' until a networked backend is available.")]
    NotImplemented { provider: String },

    /// Provider is not recognised at all
    #[error("Unsupported cache provider '{provider}'. Supported providers: local")]
    UnsupportedProvider { provider: String },

    /// Configuration values that cannot produce a working cache
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Repository synchronization errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// The materialized content path is missing after sync
    #[error("Repository path does not exist: {path}")]
    MissingPath { path: PathBuf },

    /// The repository could not be reached or retries were exhausted
    #[error("Repository sync failed: {message}")]
    Failed { message: String },

    /// Filesystem failure while materializing the content tree
    #[error("Repository I/O failure at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whole-cycle catalog failures
///
/// Any of these leaves the previously published generation in place.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The content root could not be read
    #[error("Failed to access content root: {path}")]
    ContentRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content root exists but is not a directory
    #[error("Content root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Another load or reload has not finished yet
    #[error("A catalog load is already in progress.\n\nLoads and reloads must be serialized; retry once the current cycle completes.")]
    ReloadInProgress,

    /// The repository collaborator failed before the scan started
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Rendering failures for a single item
#[derive(Error, Debug)]
pub enum RenderError {
    /// No item with this id in the published generation
    #[error("Template not found: {id}")]
    NotFound { id: String },

    /// The registry disabled this item
    #[error("Template '{id}' is disabled by the registry and cannot be rendered")]
    Disabled { id: String },

    /// Arguments failed schema validation
    #[error("Invalid arguments for template '{id}':\n  {}", details.join("\n  "))]
    InvalidArguments { id: String, details: Vec<String> },

    /// The template engine rejected the render
    #[error("Failed to render template '{id}'")]
    Template {
        id: String,
        #[source]
        source: minijinja::Error,
    },
}

impl CatalogError {
    /// Log the failure with the level its severity deserves
    pub fn log(&self) {
        match self {
            CatalogError::ReloadInProgress => {
                tracing::warn!("Catalog load rejected: {}", self);
            }
            _ => {
                tracing::error!("Catalog load failed, previous generation kept: {}", self);
            }
        }
    }
}
