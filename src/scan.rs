//! Corpus scanner.
//!
//! Recursively enumerates files under a root directory whose name ends
//! with a given suffix. Unreadable subdirectories are skipped rather than
//! treated as fatal, and the result is sorted so a single run is
//! reproducible.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect every file under `root` (recursively) whose file name ends
/// with `extension`, matched case-sensitively.
pub fn scan_corpus(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Corpus root does not exist: {}", root.display());
    }

    let mut files = Vec::new();

    // Traversal errors (permission denied, dangling links) are dropped,
    // not propagated: an inaccessible subdirectory skips its subtree.
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.ends_with(extension) {
            files.push(entry.into_path());
        }
    }

    // Sort for deterministic ordering
    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_recursive_with_extension() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("nested/deep")).unwrap();
        touch(&root.join("alpha.md"), "# A");
        touch(&root.join("nested/beta.md"), "# B");
        touch(&root.join("nested/deep/gamma.md"), "# C");
        touch(&root.join("nested/notes.txt"), "plain");
        touch(&root.join("image.png"), "");

        let files = scan_corpus(root, ".md").unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.to_string_lossy().ends_with(".md")));
    }

    #[test]
    fn test_scan_is_sorted() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("zeta.md"), "");
        touch(&root.join("alpha.md"), "");
        touch(&root.join("mid.md"), "");

        let files = scan_corpus(root, ".md").unwrap();
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_scan_case_sensitive_suffix() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("upper.MD"), "");
        touch(&root.join("lower.md"), "");

        let files = scan_corpus(root, ".md").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("lower.md"));
    }

    #[test]
    fn test_scan_missing_root_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(scan_corpus(&missing, ".md").is_err());
    }

    #[test]
    fn test_scan_empty_dir() {
        let tmp = TempDir::new().unwrap();
        let files = scan_corpus(tmp.path(), ".md").unwrap();
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_survives_dangling_symlink() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("visible.md"), "");
        std::os::unix::fs::symlink(root.join("gone.md"), root.join("broken.md")).unwrap();

        let files = scan_corpus(root, ".md").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("visible.md"));
    }
}
