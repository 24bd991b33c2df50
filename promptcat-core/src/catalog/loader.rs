//! One load cycle: scan, parse, classify, merge, compile
//!
//! Per-item problems are collected into the [`LoadReport`]; only a content
//! root failure ends the cycle early. The returned generation is complete
//! and ready to publish.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::compiler::{build_argument_schema, compile_schema, CompiledItem, TemplateSetBuilder};
use super::generation::Generation;
use super::report::{file_stem, LoadErrorKind, LoadReport};
use super::scanner::{scan_content_tree, ListingCache};
use crate::error::CatalogError;
use crate::item::{ItemDefinition, ItemRuntime};
use crate::registry::{apply_override, Registry};
use crate::validator::{validate, DocumentFormat, SourceDocument, StructuralError};

/// An item that compiled, waiting for the environment to be frozen
struct PendingItem {
    definition: ItemDefinition,
    runtime: ItemRuntime,
    argument_schema: serde_json::Value,
    validator: jsonschema::JSONSchema,
    source_path: PathBuf,
    template_name: String,
}

/// Build the next generation from the tree at `root`
pub(crate) async fn build_generation(
    root: &Path,
    number: u64,
    listings: &ListingCache,
    listing_ttl: Duration,
) -> Result<(Generation, LoadReport), CatalogError> {
    let scan = scan_content_tree(root, listings, listing_ttl).await?;
    let mut report = LoadReport {
        generation: number,
        ..LoadReport::default()
    };

    for failure in &scan.failures {
        report.error(&failure.path, None, LoadErrorKind::Io, failure.message.clone());
    }

    let registry = match &scan.registry {
        Some(path) => match Registry::load(path).await {
            Ok(registry) => registry,
            Err(e) => {
                warn!("Ignoring malformed registry {}: {:#}", path.display(), e);
                report.warn(path, None, format!("registry ignored: {e:#}"));
                Registry::empty()
            }
        },
        None => Registry::empty(),
    };

    let mut templates = TemplateSetBuilder::new();
    for path in &scan.partials {
        let name = file_stem(path);
        if templates.has_partial(&name) {
            report.warn(
                path,
                None,
                format!("partial '{name}' is already defined, this copy is ignored"),
            );
            continue;
        }
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(e) => {
                report.error(path, Some(&name), LoadErrorKind::Io, e.to_string());
                continue;
            }
        };
        if let Err(e) = templates.add_partial(&name, source) {
            report.error(path, Some(&name), LoadErrorKind::Template, e.to_string());
        }
    }

    let mut claimed: HashMap<String, PathBuf> = HashMap::new();
    let mut pending = Vec::new();

    for path in &scan.documents {
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(e) => {
                report.error(path, None, LoadErrorKind::Io, e.to_string());
                continue;
            }
        };

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentFormat::from_extension)
            .unwrap_or(DocumentFormat::Yaml);
        let document = match SourceDocument::parse(&source, format) {
            Ok(document) => document,
            Err(e) => {
                report.error(path, None, LoadErrorKind::Parse, format!("{e:#}"));
                continue;
            }
        };

        let validated = match validate(document) {
            Ok(validated) => validated,
            Err(e) => {
                let (id, kind) = match &e {
                    StructuralError::MissingId => (None, LoadErrorKind::MissingId),
                    StructuralError::MissingTemplate { id } => {
                        (Some(id.as_str()), LoadErrorKind::MissingTemplate)
                    }
                };
                report.error(path, id, kind, e.to_string());
                continue;
            }
        };

        let id = validated.definition.id.clone();
        if let Some(first) = claimed.get(&id) {
            report.error(
                path,
                Some(&id),
                LoadErrorKind::DuplicateId,
                format!("id '{}' is already defined by {}", id, first.display()),
            );
            continue;
        }

        if !validated.issues.is_empty() {
            debug!("'{}' metadata issues: {}", id, validated.issues.join("; "));
        }
        for partial in &validated.declared_partials {
            if !templates.has_partial(partial) {
                report.warn(
                    path,
                    Some(&id),
                    format!("declared partial '{partial}' does not exist"),
                );
            }
        }

        let runtime = apply_override(validated.runtime, registry.get(&id));

        let argument_schema = build_argument_schema(&validated.definition.arguments);
        let validator = match compile_schema(&argument_schema) {
            Ok(validator) => validator,
            Err(message) => {
                report.error(path, Some(&id), LoadErrorKind::Schema, message);
                continue;
            }
        };

        let template_name =
            match templates.add_item(&id, validated.definition.template.clone()) {
                Ok(name) => name,
                Err(e) => {
                    report.error(path, Some(&id), LoadErrorKind::Template, e.to_string());
                    continue;
                }
            };
        // Only a document that compiled claims its id
        claimed.insert(id.clone(), path.clone());

        pending.push(PendingItem {
            definition: validated.definition,
            runtime,
            argument_schema,
            validator,
            source_path: path.clone(),
            template_name,
        });
    }

    let env = templates.finish();
    let items: Vec<Arc<CompiledItem>> = pending
        .into_iter()
        .map(|item| {
            Arc::new(CompiledItem::new(
                item.definition,
                item.runtime,
                item.argument_schema,
                item.validator,
                item.source_path,
                Arc::clone(&env),
                item.template_name,
            ))
        })
        .collect();

    let generation = Generation::new(number, items);
    report.compiled_count = generation.len();

    info!(
        "Built generation {}: {} items, {} errors, {} warnings",
        number,
        report.compiled_count,
        report.errors.len(),
        report.warnings.len()
    );

    Ok((generation, report))
}
