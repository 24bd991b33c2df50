//! Item Validator - structural checks and runtime-state classification
//!
//! Takes one parsed source document and decides what the catalog should do
//! with it:
//!
//! | Document shape                                   | Outcome                       |
//! |--------------------------------------------------|-------------------------------|
//! | missing `id` or `template`                       | [`StructuralError`], excluded |
//! | no `version` and no `status` in metadata         | `legacy` / source `legacy`    |
//! | metadata `id` disagrees with document `id`       | `invalid` / source `embedded` |
//! | id, title, semver version, known status present  | `active` / source `embedded`  |
//! | anything else in a metadata block                | `warning` / source `embedded` |
//!
//! Classification is pure: the same document always yields the same result.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::item::{ArgumentSpec, ItemDefinition, ItemRuntime};

mod metadata;

pub use metadata::{classify_metadata, is_semver_shaped, MetadataClassification};


/// Version reported for items without metadata
pub const LEGACY_VERSION: &str = "0.0.0";

/// Serialization format of a source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// A loosely parsed source document
///
/// Only the argument map is parsed strictly; everything the classifier needs
/// to judge is kept optional or raw so that a bad field becomes a
/// classification rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, alias = "name")]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub arguments: BTreeMap<String, ArgumentSpec>,

    #[serde(default)]
    pub template: Option<String>,

    /// Raw metadata block, judged by [`classify_metadata`]
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl SourceDocument {
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        match format {
            DocumentFormat::Yaml => {
                serde_yaml_ng::from_str(content).context("Invalid template document YAML")
            }
            DocumentFormat::Json => {
                serde_json::from_str(content).context("Invalid template document JSON")
            }
        }
    }
}

/// Reasons a document cannot become a catalog item at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Template document has no 'id'")]
    MissingId,

    #[error("Template document '{id}' has no 'template' body")]
    MissingTemplate { id: String },
}

/// A document that passed structural checks, with its classification
#[derive(Debug, Clone)]
pub struct ValidatedItem {
    pub definition: ItemDefinition,
    pub runtime: ItemRuntime,
    /// Partial templates the metadata says this item needs
    pub declared_partials: Vec<String>,
    /// Human-readable reasons behind a warning/invalid classification
    pub issues: Vec<String>,
}

/// Check structure, then classify the metadata block
pub fn validate(document: SourceDocument) -> Result<ValidatedItem, StructuralError> {
    let id = document
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(StructuralError::MissingId)?;

    let template = document
        .template
        .ok_or_else(|| StructuralError::MissingTemplate { id: id.clone() })?;

    let title = document
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| id.clone());

    let classification = classify_metadata(&id, &title, document.metadata.as_ref());
    debug!(
        "Classified '{}' as {} ({} issue(s))",
        id,
        classification.runtime.runtime_state.as_str(),
        classification.issues.len()
    );

    Ok(ValidatedItem {
        definition: ItemDefinition {
            id,
            title,
            description: document.description,
            arguments: document.arguments,
            template,
        },
        runtime: classification.runtime,
        declared_partials: classification.declared_partials,
        issues: classification.issues,
    })
}
