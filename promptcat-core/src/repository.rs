//! Repository trait - where the content tree comes from
//!
//! A repository materializes the content tree on local disk. Remote
//! strategies (git, object storage, copy-with-retry) live with the host;
//! the catalog only needs `sync` followed by a stable local path.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::SyncError;

/// Source of a content tree
#[async_trait]
pub trait Repository: Send + Sync {
    /// Bring the local copy up to date
    async fn sync(&self) -> Result<(), SyncError>;

    /// Where the synced tree lives
    fn local_path(&self) -> &Path;
}

/// A content tree that already lives on local disk
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
}

impl LocalDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Repository for LocalDirectory {
    async fn sync(&self) -> Result<(), SyncError> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SyncError::MissingPath {
                    path: self.path.clone(),
                }
            } else {
                SyncError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        if !metadata.is_dir() {
            return Err(SyncError::Failed {
                message: format!("{} is not a directory", self.path.display()),
            });
        }

        debug!("Local repository ready at {}", self.path.display());
        Ok(())
    }

    fn local_path(&self) -> &Path {
        &self.path
    }
}
