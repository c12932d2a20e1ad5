//! Transform stages.
//!
//! Each stage reads one source subtree and writes one output subtree, and no
//! two stages overlap. That independence is what lets the full build run
//! them in parallel while the watcher re-runs them one at a time.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::asset::{
    self, image,
    kind::{AssetKind, IMAGE_EXTENSIONS},
    minify,
};
use crate::config::SiteConfig;
use crate::debug;

/// One transform stage of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Css,
    Js,
    Images,
    Aux,
    Html,
}

impl Stage {
    pub const ALL: [Self; 5] = [Self::Css, Self::Js, Self::Images, Self::Aux, Self::Html];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Images => "images",
            Self::Aux => "aux",
            Self::Html => "html",
        }
    }

    /// Run this stage; returns the number of files written.
    pub fn run(self, config: &SiteConfig) -> Result<usize> {
        match self {
            Self::Css => run_css(config),
            Self::Js => run_js(config),
            Self::Images => run_images(config),
            Self::Aux => run_aux(config),
            Self::Html => run_html(config),
        }
    }

    /// Classify a changed source path to the stage that owns it.
    ///
    /// Returns `None` for paths no stage cares about (editor droppings,
    /// unrelated files, anything under the output tree).
    pub fn for_source_path(path: &Path, config: &SiteConfig) -> Option<Self> {
        let build = &config.build;

        // aux files live under the asset tree, so check them first
        if build.aux.iter().any(|aux| build.assets.join(aux) == *path) {
            return Some(Self::Aux);
        }

        if let Ok(rel) = path.strip_prefix(&build.assets) {
            return match AssetKind::from_path(path) {
                AssetKind::Css if rel.starts_with("css") => Some(Self::Css),
                AssetKind::Js if rel.starts_with("js") => Some(Self::Js),
                AssetKind::Image if rel.starts_with("img") => Some(Self::Images),
                _ => None,
            };
        }

        if AssetKind::from_path(path) == AssetKind::Html
            && path.parent() == Some(build.pages.as_path())
        {
            return Some(Self::Html);
        }

        None
    }
}

/// Minify and mirror the CSS tree.
fn run_css(config: &SiteConfig) -> Result<usize> {
    let src_dir = config.build.css_dir();
    let out_dir = config.build.asset_output_dir().join("css");

    let mut count = 0;
    for path in asset::collect_with_ext(&src_dir, &["css"]) {
        let output = mirror_path(&path, &src_dir, &out_dir)?;
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let written = if config.build.minify && !is_preminified(&path) {
            minify::css(&source).unwrap_or_else(|| {
                debug!("css"; "minify failed, copying {}", path.display());
                source
            })
        } else {
            source
        };

        fs::write(&output, written)
            .with_context(|| format!("failed to write {}", output.display()))?;
        count += 1;
    }
    Ok(count)
}

/// Minify and mirror the JS tree.
fn run_js(config: &SiteConfig) -> Result<usize> {
    let src_dir = config.build.js_dir();
    let out_dir = config.build.asset_output_dir().join("js");

    let mut count = 0;
    for path in asset::collect_with_ext(&src_dir, &["js"]) {
        let output = mirror_path(&path, &src_dir, &out_dir)?;
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let written = if config.build.minify && !is_preminified(&path) {
            minify::js(&source).unwrap_or_else(|| {
                debug!("js"; "minify failed, copying {}", path.display());
                source
            })
        } else {
            source
        };

        fs::write(&output, written)
            .with_context(|| format!("failed to write {}", output.display()))?;
        count += 1;
    }
    Ok(count)
}

/// Optimize and mirror the image tree.
fn run_images(config: &SiteConfig) -> Result<usize> {
    let src_dir = config.build.img_dir();
    let out_dir = config.build.img_output_dir();

    let mut count = 0;
    for path in asset::collect_with_ext(&src_dir, IMAGE_EXTENSIONS) {
        let output = mirror_path(&path, &src_dir, &out_dir)?;
        let data =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;

        let optimized = config
            .build
            .images
            .then(|| image::optimize(&path, &data))
            .flatten();
        match optimized {
            Some(bytes) => fs::write(&output, bytes),
            None => fs::write(&output, &data),
        }
        .with_context(|| format!("failed to write {}", output.display()))?;
        count += 1;
    }
    Ok(count)
}

/// Copy the configured auxiliary files verbatim.
fn run_aux(config: &SiteConfig) -> Result<usize> {
    let mut count = 0;
    for rel in &config.build.aux {
        let source = config.build.assets.join(rel);
        if !source.is_file() {
            debug!("aux"; "skipping missing {}", source.display());
            continue;
        }

        let output = config.build.asset_output_dir().join(rel);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(&source, &output)
            .with_context(|| format!("failed to copy {}", source.display()))?;
        count += 1;
    }
    Ok(count)
}

/// Minify the top-level pages into the output root (non-recursive).
fn run_html(config: &SiteConfig) -> Result<usize> {
    let pages_dir = &config.build.pages;
    if !pages_dir.is_dir() {
        return Ok(0);
    }

    let mut count = 0;
    let entries = fs::read_dir(pages_dir)
        .with_context(|| format!("failed to read {}", pages_dir.display()))?;
    let mut pages: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && AssetKind::from_path(p) == AssetKind::Html)
        .collect();
    pages.sort();

    fs::create_dir_all(&config.build.output)
        .with_context(|| format!("failed to create {}", config.build.output.display()))?;

    for path in pages {
        let Some(name) = path.file_name() else {
            continue;
        };
        let output = config.build.output.join(name);
        let data =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;

        let written = if config.build.minify {
            minify::html(&data)
        } else {
            data
        };
        fs::write(&output, written)
            .with_context(|| format!("failed to write {}", output.display()))?;
        count += 1;
    }
    Ok(count)
}

/// Compute the mirrored output path and ensure its parent directory exists.
fn mirror_path(source: &Path, src_root: &Path, out_root: &Path) -> Result<PathBuf> {
    let rel = source
        .strip_prefix(src_root)
        .with_context(|| format!("{} is outside {}", source.display(), src_root.display()))?;
    let output = out_root.join(rel);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(output)
}

/// `style.min.css` / `vendor.min.js` are shipped as-is.
fn is_preminified(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(".min"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture_config(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.root = root.to_path_buf();
        config.build.assets = root.join("assets");
        config.build.pages = root.to_path_buf();
        config.build.output = root.join("dist");
        config
    }

    #[test]
    fn test_css_stage_mirrors_tree() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        fs::create_dir_all(config.build.css_dir().join("vendor")).unwrap();
        fs::write(
            config.build.css_dir().join("style.css"),
            "body {\n  color: red;\n}\n",
        )
        .unwrap();
        fs::write(
            config.build.css_dir().join("vendor/grid.css"),
            ".grid {\n  display: grid;\n}\n",
        )
        .unwrap();

        let count = Stage::Css.run(&config).unwrap();
        assert_eq!(count, 2);

        let out = config.build.asset_output_dir().join("css");
        assert!(out.join("style.css").is_file());
        assert!(out.join("vendor/grid.css").is_file());

        // minified output is smaller than the formatted source
        let minified = fs::read_to_string(out.join("style.css")).unwrap();
        assert!(minified.len() < "body {\n  color: red;\n}\n".len());
    }

    #[test]
    fn test_css_stage_respects_minify_toggle() {
        let dir = TempDir::new().unwrap();
        let mut config = fixture_config(dir.path());
        config.build.minify = false;
        fs::create_dir_all(config.build.css_dir()).unwrap();
        let source = "body {\n  color: red;\n}\n";
        fs::write(config.build.css_dir().join("style.css"), source).unwrap();

        Stage::Css.run(&config).unwrap();
        let out = config.build.asset_output_dir().join("css/style.css");
        assert_eq!(fs::read_to_string(out).unwrap(), source);
    }

    #[test]
    fn test_preminified_copied_verbatim() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        fs::create_dir_all(config.build.js_dir()).unwrap();
        let source = "var x=1;console.log(x);\n";
        fs::write(config.build.js_dir().join("vendor.min.js"), source).unwrap();

        Stage::Js.run(&config).unwrap();
        let out = config.build.asset_output_dir().join("js/vendor.min.js");
        assert_eq!(fs::read_to_string(out).unwrap(), source);
    }

    #[test]
    fn test_aux_stage_skips_missing() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        fs::create_dir_all(config.build.img_dir()).unwrap();
        fs::write(config.build.img_dir().join("site.webmanifest"), "{}").unwrap();
        // browserconfig.xml intentionally absent

        let count = Stage::Aux.run(&config).unwrap();
        assert_eq!(count, 1);
        assert!(
            config
                .build
                .img_output_dir()
                .join("site.webmanifest")
                .is_file()
        );
    }

    #[test]
    fn test_html_stage_is_non_recursive() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        fs::write(dir.path().join("index.html"), "<html><body> hi </body></html>").unwrap();
        fs::create_dir_all(dir.path().join("drafts")).unwrap();
        fs::write(dir.path().join("drafts/old.html"), "<html></html>").unwrap();

        let count = Stage::Html.run(&config).unwrap();
        assert_eq!(count, 1);
        assert!(config.build.output.join("index.html").is_file());
        assert!(!config.build.output.join("old.html").exists());
    }

    #[test]
    fn test_missing_source_trees_are_noops() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        for stage in Stage::ALL {
            assert_eq!(stage.run(&config).unwrap(), 0, "{}", stage.label());
        }
    }

    #[test]
    fn test_for_source_path_classification() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(dir.path());
        let assets = &config.build.assets;

        assert_eq!(
            Stage::for_source_path(&assets.join("css/style.css"), &config),
            Some(Stage::Css)
        );
        assert_eq!(
            Stage::for_source_path(&assets.join("js/app.js"), &config),
            Some(Stage::Js)
        );
        assert_eq!(
            Stage::for_source_path(&assets.join("img/logo.png"), &config),
            Some(Stage::Images)
        );
        assert_eq!(
            Stage::for_source_path(&assets.join("img/site.webmanifest"), &config),
            Some(Stage::Aux)
        );
        assert_eq!(
            Stage::for_source_path(&dir.path().join("index.html"), &config),
            Some(Stage::Html)
        );

        // wrong kind in the right tree, html outside the pages dir, output files
        assert_eq!(
            Stage::for_source_path(&assets.join("css/readme.txt"), &config),
            None
        );
        assert_eq!(
            Stage::for_source_path(&dir.path().join("drafts/a.html"), &config),
            None
        );
        assert_eq!(
            Stage::for_source_path(&config.build.output.join("index.html"), &config),
            None
        );
    }
}
