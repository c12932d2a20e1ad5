//! Asset classification, collection and transforms.

pub mod image;
pub mod kind;
pub mod minify;

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

/// Collect all regular files under `dir`, sorted for deterministic builds.
///
/// A missing directory yields an empty list rather than an error, so stages
/// with no source tree are no-ops.
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }

    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect();
    files.sort();
    files
}

/// Collect files under `dir` whose extension matches `exts` (case-insensitive).
pub fn collect_with_ext(dir: &Path, exts: &[&str]) -> Vec<PathBuf> {
    collect_files(dir)
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .is_some_and(|e| exts.contains(&e.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(collect_files(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_collect_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.css"), "").unwrap();
        fs::write(dir.path().join("a.css"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.css"), "").unwrap();

        let files = collect_files(dir.path());
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_collect_with_ext() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("style.css"), "").unwrap();
        fs::write(dir.path().join("STYLE2.CSS"), "").unwrap();
        fs::write(dir.path().join("app.js"), "").unwrap();

        let files = collect_with_ext(dir.path(), &["css"]);
        assert_eq!(files.len(), 2);
    }
}
