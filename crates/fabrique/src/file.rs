//! Source file representation used throughout parsing and diagnostics.

use std::{path::PathBuf, sync::Arc};

use fabrique_macros_core::SourceCode;

/// A source file identified by its path components (relative to the source
/// root) together with its full text. Cheap to clone: both fields are
/// reference-counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: Arc<Vec<String>>,
    pub code: Arc<String>,
}

impl From<SourceFile> for SourceCode {
    fn from(file: SourceFile) -> Self {
        SourceCode::from(&file)
    }
}

impl From<&SourceFile> for SourceCode {
    fn from(file: &SourceFile) -> Self {
        let path = PathBuf::from_iter(file.path.iter());
        SourceCode {
            source: file.code.to_string(),
            name: path.to_string_lossy().to_string(),
        }
    }
}

impl std::fmt::Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", PathBuf::from_iter(self.path.iter()).display())
    }
}

impl SourceFile {
    pub fn new(path: Vec<String>, code: String) -> Self {
        Self { path: path.into(), code: code.into() }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn code(&self) -> &str {
        self.code.as_ref()
    }
}
