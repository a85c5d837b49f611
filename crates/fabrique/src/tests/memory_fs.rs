//! An in-memory [`crate::fs::Filesystem`] fake used by integration tests so
//! `import(...)` and module resolution can be exercised without touching
//! the real filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fs::Filesystem;

#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: HashMap<String, String>,
}

impl MemoryFilesystem {
    pub fn new(files: impl IntoIterator<Item = (&'static str, &'static str)>) -> Self {
        Self { files: files.into_iter().map(|(path, content)| (path.to_string(), content.to_string())).collect() }
    }
}

impl Filesystem for MemoryFilesystem {
    fn path_is_absolute(&self, path: &str) -> bool {
        Path::new(path).is_absolute()
    }

    fn join_path(&self, base: &str, path: &str) -> String {
        Path::new(base).join(path).to_string_lossy().to_string()
    }

    fn directory_of(&self, path: &str) -> String {
        Path::new(path).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default()
    }

    fn find_module(&self, srcroot: &str, current_subdir: &str, import_path: &str) -> Option<String> {
        let srcroot = PathBuf::from(srcroot);
        let mut candidate_dir = PathBuf::from(current_subdir);

        loop {
            let with_ext = candidate_dir.join(import_path).with_extension("fab");
            let key = with_ext.to_string_lossy().to_string();
            if self.files.contains_key(&key) {
                return Some(key);
            }

            if candidate_dir == srcroot {
                return None;
            }
            match candidate_dir.parent() {
                Some(parent) if parent.starts_with(&srcroot) || parent == srcroot => candidate_dir = parent.to_path_buf(),
                _ => return None,
            }
        }
    }

    fn read_to_string(&self, path: &str) -> std::io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }
}
