//! Registry overrides
//!
//! An optional document at the content root that overrides deprecation,
//! grouping and visibility per item id:
//!
//! ```yaml
//! entries:
//!   code-review:
//!     group: engineering
//!     visibility: internal
//!   old-summary:
//!     deprecated: true
//! ```
//!
//! The document is read once per load cycle. Without one, no item is
//! overridden.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::item::{ItemRuntime, ItemSource, RuntimeState, Visibility};
use crate::validator::DocumentFormat;

/// File names recognised as the registry document, in lookup order
pub const REGISTRY_FILE_NAMES: &[&str] = &["registry.yaml", "registry.yml", "registry.json"];

/// Override for a single item id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub deprecated: bool,
}

/// Parsed registry document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub entries: HashMap<String, RegistryEntry>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        match format {
            DocumentFormat::Yaml => {
                serde_yaml_ng::from_str(content).context("Invalid registry YAML")
            }
            DocumentFormat::Json => serde_json::from_str(content).context("Invalid registry JSON"),
        }
    }

    /// Read and parse a registry document
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read registry: {}", path.display()))?;

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentFormat::from_extension)
            .unwrap_or(DocumentFormat::Yaml);

        let registry = Self::parse(&content, format)
            .with_context(|| format!("Failed to parse registry: {}", path.display()))?;
        debug!(
            "Loaded registry with {} entries from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Whether `file_name` at the content root names a registry document
    pub fn is_registry_file(file_name: &str) -> bool {
        REGISTRY_FILE_NAMES.contains(&file_name)
    }

    /// Locate the registry document at the root, honoring lookup order
    pub fn find_in(root: &Path, root_files: &[PathBuf]) -> Option<PathBuf> {
        REGISTRY_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|candidate| root_files.contains(candidate))
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply a registry override to a classification
///
/// A deprecated entry disables the item whatever it was classified as. Any
/// entry marks the item as registry-sourced and carries its group and
/// visibility; without an entry the classification passes through.
pub fn apply_override(mut runtime: ItemRuntime, entry: Option<&RegistryEntry>) -> ItemRuntime {
    let Some(entry) = entry else {
        return runtime;
    };

    if entry.deprecated {
        runtime.runtime_state = RuntimeState::Disabled;
    }
    runtime.source = ItemSource::Registry;
    runtime.group = entry.group.clone();
    runtime.visibility = Some(entry.visibility);
    runtime
}
