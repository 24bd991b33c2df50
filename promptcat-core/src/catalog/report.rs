//! Load cycle reporting

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of one load or reload cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Generation number published by this cycle
    pub generation: u64,
    pub compiled_count: usize,
    pub errors: Vec<LoadError>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn error(
        &mut self,
        path: &Path,
        id: Option<&str>,
        kind: LoadErrorKind,
        message: impl Into<String>,
    ) {
        self.errors.push(LoadError::new(path, id, kind, message));
    }

    pub(crate) fn warn(&mut self, path: &Path, id: Option<&str>, message: impl Into<String>) {
        self.warnings.push(LoadWarning {
            path: path.to_path_buf(),
            id: id.map(str::to_string),
            message: message.into(),
        });
    }
}

/// Why a source was excluded from the generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    /// File or directory could not be read
    Io,
    /// Document is not valid YAML/JSON for its extension
    Parse,
    MissingId,
    MissingTemplate,
    /// Another document earlier in path order already claimed the id
    DuplicateId,
    /// Template or partial failed to compile
    Template,
    /// Argument schema could not be built
    Schema,
}

/// A per-item failure; never aborts the cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadError {
    pub path: PathBuf,
    /// Item id, or the file stem when the id is unknown
    pub id: String,
    pub kind: LoadErrorKind,
    pub message: String,
}

impl LoadError {
    pub fn new(
        path: &Path,
        id: Option<&str>,
        kind: LoadErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let id = id.map(str::to_string).unwrap_or_else(|| file_stem(path));
        Self {
            path: path.to_path_buf(),
            id,
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {:?}: {}",
            self.id,
            self.path.display(),
            self.kind,
            self.message
        )
    }
}

/// A non-fatal diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadWarning {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: String,
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_id_falls_back_to_stem() {
        let error = LoadError::new(
            Path::new("/content/broken.yaml"),
            None,
            LoadErrorKind::Parse,
            "bad yaml",
        );
        assert_eq!(error.id, "broken");

        let error = LoadError::new(
            Path::new("/content/broken.yaml"),
            Some("real-id"),
            LoadErrorKind::MissingTemplate,
            "no template",
        );
        assert_eq!(error.id, "real-id");
    }

    #[test]
    fn test_report_serializes_kinds_in_snake_case() {
        let mut report = LoadReport::default();
        report.error(Path::new("x.yaml"), None, LoadErrorKind::DuplicateId, "dup");
        report.warn(Path::new("y.yaml"), Some("y"), "missing partial");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"][0]["kind"], "duplicate_id");
        assert_eq!(json["warnings"][0]["id"], "y");
        assert!(report.has_errors());
    }
}
