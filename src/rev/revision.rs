//! Asset revisioning: embed a content hash in every fingerprintable filename.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::asset::{self, kind::AssetKind};
use crate::debug;
use crate::utils::{hash, path::rel_key};

use super::RevManifest;

/// Fingerprint every matching file under the output root.
///
/// Each file is renamed to `stem.<hash>.ext` in place, so the original name
/// no longer exists afterwards. Returns the manifest of all renames; an
/// output tree with nothing to fingerprint yields an empty manifest.
pub fn revision_assets(output_root: &Path) -> Result<RevManifest> {
    let mut manifest = RevManifest::new();

    for path in asset::collect_files(output_root) {
        if !AssetKind::from_path(&path).is_fingerprinted() {
            continue;
        }

        let hash = hash::fingerprint_file(&path)
            .with_context(|| format!("failed to hash {}", path.display()))?;
        let revisioned = revisioned_name(&path, &hash);
        fs::rename(&path, &revisioned).with_context(|| {
            format!(
                "failed to rename {} -> {}",
                path.display(),
                revisioned.display()
            )
        })?;

        let original_key = rel_key(&path, output_root)
            .ok_or_else(|| anyhow!("non-UTF-8 output path: {}", path.display()))?;
        let revisioned_key = rel_key(&revisioned, output_root)
            .ok_or_else(|| anyhow!("non-UTF-8 output path: {}", revisioned.display()))?;
        debug!("rev"; "{} -> {}", original_key, revisioned_key);
        manifest.insert(original_key, revisioned_key);
    }

    Ok(manifest)
}

/// `assets/img/logo.png` + `3f2a9c1d` → `assets/img/logo.3f2a9c1d.png`.
fn revisioned_name(path: &Path, hash: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{hash}.{ext}"),
        None => format!("{stem}.{hash}"),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::fingerprint;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_revisioned_name() {
        assert_eq!(
            revisioned_name(Path::new("assets/img/logo.png"), "3f2a9c1d"),
            PathBuf::from("assets/img/logo.3f2a9c1d.png")
        );
        assert_eq!(
            assets_join("style.min.css"),
            PathBuf::from("style.min.aaaaaaaa.css")
        );
    }

    fn assets_join(name: &str) -> PathBuf {
        revisioned_name(Path::new(name), "aaaaaaaa")
    }

    #[test]
    fn test_revision_renames_and_records() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("assets/img");
        fs::create_dir_all(&img).unwrap();
        fs::write(img.join("logo.png"), "fake png bytes").unwrap();

        let manifest = revision_assets(dir.path()).unwrap();

        // original gone, exactly one manifest entry pointing at the new name
        assert!(!img.join("logo.png").exists());
        assert_eq!(manifest.len(), 1);

        let hash = fingerprint("fake png bytes");
        let expected = format!("assets/img/logo.{hash}.png");
        assert_eq!(manifest.get("assets/img/logo.png"), Some(expected.as_str()));
        assert!(dir.path().join(&expected).exists());
    }

    #[test]
    fn test_revision_skips_html() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let manifest = revision_assets(dir.path()).unwrap();
        assert!(manifest.is_empty());
        assert!(dir.path().join("index.html").exists());
    }

    #[test]
    fn test_revision_empty_tree() {
        let dir = TempDir::new().unwrap();
        let manifest = revision_assets(dir.path()).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_revision_stable_for_unchanged_content() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        for dir in [&dir_a, &dir_b] {
            let css = dir.path().join("assets/css");
            fs::create_dir_all(&css).unwrap();
            fs::write(css.join("style.css"), "body{color:red}").unwrap();
        }

        let a = revision_assets(dir_a.path()).unwrap();
        let b = revision_assets(dir_b.path()).unwrap();
        assert_eq!(
            a.get("assets/css/style.css"),
            b.get("assets/css/style.css")
        );
    }
}
