//! promptcat core library exports

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod item;
pub mod registry;
pub mod repository;
pub mod validator;

pub use catalog::{CatalogService, CatalogStats, CompiledItem, ListFilter, LoadReport};
pub use config::PromptcatConfig;
pub use error::{CacheError, CatalogError, RenderError, SyncError};
pub use repository::{LocalDirectory, Repository};
