//! Web-app manifest and browserconfig fix-up.
//!
//! The icon collateral under the image output directory needs more than the
//! generic text pass: webmanifest icon entries reference assets with a
//! leading slash and have to be patched through the JSON structure, and
//! browserconfig-style XML mixes full paths with bare filenames. This pass
//! runs after the revisioner and the generic rewriter, against the already
//! renamed files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::asset;
use crate::config::SiteConfig;
use crate::debug;

use super::RevManifest;

/// Patch icon references in `.webmanifest` and `.xml` files under the image
/// output directory.
///
/// With an empty manifest there is nothing to point at, so the pass is a
/// no-op rather than an error.
pub fn rewrite_icon_references(manifest: &RevManifest, config: &SiteConfig) -> Result<()> {
    if manifest.is_empty() {
        return Ok(());
    }

    let img_dir = config.build.img_output_dir();
    if !img_dir.exists() {
        return Ok(());
    }

    for path in asset::collect_files(&img_dir) {
        match path.extension().and_then(|e| e.to_str()) {
            Some("webmanifest") => rewrite_webmanifest(&path, manifest, config)?,
            Some("xml") => rewrite_browserconfig(&path, manifest, config)?,
            _ => {}
        }
    }

    Ok(())
}

/// Patch the `icons` array of a web-app manifest.
///
/// Each `src` is stripped of its leading slash and looked up in the manifest;
/// hits are rewritten to an absolute-rooted revisioned path, misses are left
/// untouched. The file is written back pretty-printed.
fn rewrite_webmanifest(path: &Path, manifest: &RevManifest, config: &SiteConfig) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut doc: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid web manifest {}", path.display()))?;

    if let Some(icons) = doc.get_mut("icons").and_then(Value::as_array_mut) {
        for icon in icons {
            let Some(entry) = icon.as_object_mut() else {
                continue;
            };
            let Some(src) = entry.get("src").and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };

            let key = src.trim_start_matches('/');
            let Some(revisioned) = manifest.get(key) else {
                continue; // not revisioned this run, leave as-is
            };

            let rooted = format!("/{}", strip_output_prefix(revisioned, config));
            debug!("icons"; "{} -> {}", src, rooted);
            entry.insert("src".to_string(), Value::String(rooted));
        }
    }

    let pretty = serde_json::to_string_pretty(&doc)?;
    fs::write(path, pretty).with_context(|| format!("failed to write {}", path.display()))
}

/// Substitute revisioned names into a browserconfig-style XML file.
///
/// Raw global text substitution over both the full original path and the
/// bare filename (image directory prefix stripped). The full path runs first
/// so the bare-filename pass cannot split it.
fn rewrite_browserconfig(path: &Path, manifest: &RevManifest, config: &SiteConfig) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let img_prefix = format!("{}/img/", config.build.asset_prefix());

    let mut text = content.clone();
    for (original, revisioned) in manifest.iter() {
        text = text.replace(original, revisioned);

        if let (Some(short_from), Some(short_to)) = (
            original.strip_prefix(&img_prefix),
            revisioned.strip_prefix(&img_prefix),
        ) {
            text = text.replace(short_from, short_to);
        }
    }

    if text != content {
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        debug!("icons"; "{}", path.display());
    }
    Ok(())
}

/// Manifest values are output-relative already; strip the output directory
/// name defensively in case a producer rooted them one level higher.
fn strip_output_prefix<'a>(value: &'a str, config: &SiteConfig) -> &'a str {
    let Some(name) = config.build.output.file_name().and_then(|n| n.to_str()) else {
        return value;
    };
    value
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture_config(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.root = root.to_path_buf();
        config.build.assets = root.join("assets");
        config.build.output = root.join("dist");
        config
    }

    fn manifest_with(entries: &[(&str, &str)]) -> RevManifest {
        let mut manifest = RevManifest::new();
        for (k, v) in entries {
            manifest.insert(*k, *v);
        }
        manifest
    }

    #[test]
    fn test_webmanifest_icons_rewritten() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        let img_dir = config.build.img_output_dir();
        fs::create_dir_all(&img_dir).unwrap();

        fs::write(
            img_dir.join("site.11223344.webmanifest"),
            r#"{"name":"demo","icons":[
                {"src":"/assets/img/icon-192.png","sizes":"192x192"},
                {"src":"/assets/img/unknown.png"}
            ]}"#,
        )
        .unwrap();

        let manifest = manifest_with(&[(
            "assets/img/icon-192.png",
            "assets/img/icon-192.3f2a9c1d.png",
        )]);
        rewrite_icon_references(&manifest, &config).unwrap();

        let doc: Value = serde_json::from_str(
            &fs::read_to_string(img_dir.join("site.11223344.webmanifest")).unwrap(),
        )
        .unwrap();
        let icons = doc["icons"].as_array().unwrap();
        assert_eq!(
            icons[0]["src"].as_str(),
            Some("/assets/img/icon-192.3f2a9c1d.png")
        );
        // sibling fields survive, unmatched entries stay untouched
        assert_eq!(icons[0]["sizes"].as_str(), Some("192x192"));
        assert_eq!(icons[1]["src"].as_str(), Some("/assets/img/unknown.png"));
    }

    #[test]
    fn test_webmanifest_without_icons_field() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        let img_dir = config.build.img_output_dir();
        fs::create_dir_all(&img_dir).unwrap();
        fs::write(img_dir.join("site.webmanifest"), r#"{"name":"demo"}"#).unwrap();

        let manifest = manifest_with(&[("assets/img/a.png", "assets/img/a.aaaaaaaa.png")]);
        rewrite_icon_references(&manifest, &config).unwrap();

        let doc: Value =
            serde_json::from_str(&fs::read_to_string(img_dir.join("site.webmanifest")).unwrap())
                .unwrap();
        assert_eq!(doc["name"].as_str(), Some("demo"));
    }

    #[test]
    fn test_browserconfig_short_and_full_names() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        let img_dir = config.build.img_output_dir();
        fs::create_dir_all(&img_dir).unwrap();

        fs::write(
            img_dir.join("browserconfig.55667788.xml"),
            "<browserconfig><msapplication><tile>\
             <square150x150logo src=\"/assets/img/mstile-150x150.png\"/>\
             <square70x70logo src=\"mstile-150x150.png\"/>\
             </tile></msapplication></browserconfig>",
        )
        .unwrap();

        let manifest = manifest_with(&[(
            "assets/img/mstile-150x150.png",
            "assets/img/mstile-150x150.3f2a9c1d.png",
        )]);
        rewrite_icon_references(&manifest, &config).unwrap();

        let text =
            fs::read_to_string(img_dir.join("browserconfig.55667788.xml")).unwrap();
        assert!(text.contains("/assets/img/mstile-150x150.3f2a9c1d.png"));
        assert!(text.contains("src=\"mstile-150x150.3f2a9c1d.png\""));
        assert!(!text.contains("mstile-150x150.png"));
    }

    #[test]
    fn test_empty_manifest_is_noop() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        let img_dir = config.build.img_output_dir();
        fs::create_dir_all(&img_dir).unwrap();

        let original = r#"{"icons":[{"src":"/assets/img/icon.png"}]}"#;
        fs::write(img_dir.join("site.webmanifest"), original).unwrap();

        rewrite_icon_references(&RevManifest::new(), &config).unwrap();
        assert_eq!(
            fs::read_to_string(img_dir.join("site.webmanifest")).unwrap(),
            original
        );
    }

    #[test]
    fn test_missing_img_dir_is_noop() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        let manifest = manifest_with(&[("assets/img/a.png", "assets/img/a.aaaaaaaa.png")]);
        rewrite_icon_references(&manifest, &config).unwrap();
    }

    #[test]
    fn test_strip_output_prefix() {
        let config = fixture_config(&PathBuf::from("/project"));
        assert_eq!(
            strip_output_prefix("dist/assets/img/a.png", &config),
            "assets/img/a.png"
        );
        assert_eq!(
            strip_output_prefix("assets/img/a.png", &config),
            "assets/img/a.png"
        );
    }
}
