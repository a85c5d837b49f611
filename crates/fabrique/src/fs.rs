//! The filesystem collaborator contract: path arithmetic and module
//! resolution, kept behind a trait so the evaluator never touches `std::fs`
//! directly. `OsFilesystem` is the concrete, std-backed implementation
//! used by the `fabriquec` binary.

use std::path::{Path, PathBuf};

/// Everything the evaluator needs from the filesystem to resolve `import`
/// statements and `file(...)` paths, kept minimal and mockable.
pub trait Filesystem {
    fn path_is_absolute(&self, path: &str) -> bool;
    fn join_path(&self, base: &str, path: &str) -> String;
    fn directory_of(&self, path: &str) -> String;
    /// Resolves an import path to the absolute path of a `.fab` module,
    /// searching the current subdirectory first and then each ancestor up
    /// to `srcroot`, per the module search order.
    fn find_module(&self, srcroot: &str, current_subdir: &str, import_path: &str) -> Option<String>;
    fn read_to_string(&self, path: &str) -> std::io::Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
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
        let mut candidate_dir = srcroot.join(current_subdir);

        loop {
            let with_ext = candidate_dir.join(import_path).with_extension("fab");
            if with_ext.is_file() {
                return Some(with_ext.to_string_lossy().to_string());
            }

            let bare = candidate_dir.join(import_path);
            if bare.is_file() {
                return Some(bare.to_string_lossy().to_string());
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
        std::fs::read_to_string(path)
    }
}
