//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve URL to filesystem path.
///
/// Handles `index.html` for directories and falls back to `<name>.html` for
/// extensionless page URLs (`/about` serves `about.html`).
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    // Reject paths with suspicious patterns early
    if clean.contains("..") {
        return None;
    }

    let mut local = serve_root.join(&clean);
    if !clean.is_empty() && !local.exists() {
        local = with_html_suffix(&local);
    }

    // Canonicalize to resolve symlinks and verify path is under serve_root
    // This prevents traversal via symlinks or encoded sequences
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Normalize URL: decode, strip query string, trim slashes
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let decoded = percent_decode_str(url)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    let path = decoded.split('?').next().unwrap_or(&decoded);
    path.trim_matches('/').to_string()
}

/// Append `.html` without clobbering dots already in the name.
fn with_html_suffix(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".html");
    PathBuf::from(name)
}
