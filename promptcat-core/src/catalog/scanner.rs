//! Content tree scanner
//!
//! Walks the content root and sorts what it finds into item documents,
//! partial templates and the registry document. Directory listings are
//! memoized in the cache engine keyed by directory path, so repeated loads
//! of an unchanged tree inside the listing TTL do not touch the filesystem
//! for directory reads. File contents are always read fresh.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::cache::LocalCache;
use crate::error::CatalogError;
use crate::registry::Registry;
use crate::validator::DocumentFormat;

/// Directory name whose contents are registered as partial templates
pub const PARTIALS_DIR: &str = "partials";

/// Memoized directory listings, keyed by directory path
pub type ListingCache = LocalCache<PathBuf, Arc<Vec<ListingEntry>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One visible entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
}

/// A directory below the root that could not be listed
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Everything one scan discovered, in sorted path order
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub documents: Vec<PathBuf>,
    pub partials: Vec<PathBuf>,
    pub registry: Option<PathBuf>,
    pub failures: Vec<ScanFailure>,
}

/// Scan a content root
///
/// Only a failure to list the root itself is fatal. Unreadable directories
/// below it are recorded in [`ScanOutcome::failures`] and skipped.
pub async fn scan_content_tree(
    root: &Path,
    listings: &ListingCache,
    listing_ttl: Duration,
) -> Result<ScanOutcome, CatalogError> {
    let metadata = tokio::fs::metadata(root)
        .await
        .map_err(|source| CatalogError::ContentRoot {
            path: root.to_path_buf(),
            source,
        })?;
    if !metadata.is_dir() {
        return Err(CatalogError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    info!("Scanning content tree: {}", root.display());

    let root_listing = list_directory(root, listings, listing_ttl)
        .await
        .map_err(|source| CatalogError::ContentRoot {
            path: root.to_path_buf(),
            source,
        })?;

    let mut outcome = ScanOutcome::default();

    let root_files: Vec<PathBuf> = root_listing
        .iter()
        .filter(|entry| entry.kind == EntryKind::File && Registry::is_registry_file(&entry.name))
        .map(|entry| entry.path.clone())
        .collect();
    outcome.registry = Registry::find_in(root, &root_files);
    for ignored in root_files
        .iter()
        .filter(|path| Some(*path) != outcome.registry.as_ref())
    {
        warn!(
            "Ignoring additional registry document {} (using {:?})",
            ignored.display(),
            outcome.registry
        );
    }

    for entry in root_listing.iter() {
        match entry.kind {
            EntryKind::Directory => {
                let in_partials = entry.name == PARTIALS_DIR;
                walk_directory(&entry.path, in_partials, listings, listing_ttl, &mut outcome).await;
            }
            EntryKind::File if Registry::is_registry_file(&entry.name) => {}
            EntryKind::File => classify_file(entry, false, &mut outcome),
        }
    }

    outcome.documents.sort();
    outcome.partials.sort();

    info!(
        "Scan complete: {} documents, {} partials, registry: {}",
        outcome.documents.len(),
        outcome.partials.len(),
        outcome
            .registry
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(outcome)
}

fn walk_directory<'a>(
    dir: &'a Path,
    in_partials: bool,
    listings: &'a ListingCache,
    listing_ttl: Duration,
    outcome: &'a mut ScanOutcome,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        let listing = match list_directory(dir, listings, listing_ttl).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                outcome.failures.push(ScanFailure {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                });
                return;
            }
        };

        for entry in listing.iter() {
            match entry.kind {
                EntryKind::Directory => {
                    let nested_partials = in_partials || entry.name == PARTIALS_DIR;
                    debug!("Scanning subdirectory: {}", entry.path.display());
                    walk_directory(&entry.path, nested_partials, listings, listing_ttl, outcome)
                        .await;
                }
                EntryKind::File => classify_file(entry, in_partials, outcome),
            }
        }
    })
}

fn classify_file(entry: &ListingEntry, in_partials: bool, outcome: &mut ScanOutcome) {
    if in_partials {
        trace!("Found partial: {}", entry.path.display());
        outcome.partials.push(entry.path.clone());
        return;
    }

    let is_document = entry
        .path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(DocumentFormat::from_extension)
        .is_some();
    if is_document {
        trace!("Found document: {}", entry.path.display());
        outcome.documents.push(entry.path.clone());
    }
}

/// List one directory, consulting the listing cache first
///
/// Hidden entries are dropped and the rest sorted by name. Symlinks to
/// files are followed; symlinked directories are skipped so a link cycle
/// cannot recurse forever.
pub async fn list_directory(
    dir: &Path,
    listings: &ListingCache,
    listing_ttl: Duration,
) -> std::io::Result<Arc<Vec<ListingEntry>>> {
    if let Some(cached) = listings.get_async(dir).await {
        trace!("Listing cache hit: {}", dir.display());
        return Ok(cached);
    }

    let mut entries = Vec::new();
    let mut reader = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type().await?;
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            match tokio::fs::metadata(&path).await {
                Ok(target) if target.is_file() => EntryKind::File,
                _ => {
                    debug!("Skipping symlink: {}", path.display());
                    continue;
                }
            }
        } else {
            continue;
        };

        entries.push(ListingEntry { path, name, kind });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let listing = Arc::new(entries);
    listings
        .set_async(dir.to_path_buf(), Arc::clone(&listing), Some(listing_ttl))
        .await;
    Ok(listing)
}
