//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! assets = "assets"      # source asset root (css/, js/, img/ beneath it)
//! pages = "."            # directory holding top-level *.html pages
//! output = "dist"
//! minify = true          # minify CSS, JS and HTML
//! images = true          # re-encode images
//! fingerprint = true     # content-hash assets and rewrite references
//! aux = ["img/site.webmanifest", "img/browserconfig.xml"]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Source asset root. The pipeline expects `css/`, `js/` and `img/`
    /// subtrees beneath it.
    pub assets: PathBuf,

    /// Directory holding the top-level `*.html` pages (non-recursive).
    pub pages: PathBuf,

    /// Build output root.
    pub output: PathBuf,

    /// Minify CSS, JS and HTML output.
    pub minify: bool,

    /// Re-encode images, keeping whichever of original/optimized is smaller.
    pub images: bool,

    /// Fingerprint assets and rewrite references to the hashed names.
    pub fingerprint: bool,

    /// Auxiliary files copied verbatim, relative to the asset root.
    pub aux: Vec<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("assets"),
            pages: PathBuf::from("."),
            output: PathBuf::from("dist"),
            minify: true,
            images: true,
            fingerprint: true,
            aux: vec![
                PathBuf::from("img/site.webmanifest"),
                PathBuf::from("img/browserconfig.xml"),
            ],
        }
    }
}

impl BuildConfig {
    /// Name of the asset root directory as it appears under the output tree.
    pub fn asset_prefix(&self) -> &str {
        self.assets
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("assets")
    }

    pub fn css_dir(&self) -> PathBuf {
        self.assets.join("css")
    }

    pub fn js_dir(&self) -> PathBuf {
        self.assets.join("js")
    }

    pub fn img_dir(&self) -> PathBuf {
        self.assets.join("img")
    }

    /// Mirror of the asset root under the output tree.
    pub fn asset_output_dir(&self) -> PathBuf {
        self.output.join(self.asset_prefix())
    }

    /// Mirror of the image directory under the output tree.
    pub fn img_output_dir(&self) -> PathBuf {
        self.asset_output_dir().join("img")
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(config.build.assets, PathBuf::from("assets"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(config.build.minify);
        assert!(config.build.images);
        assert!(config.build.fingerprint);
        assert_eq!(config.build.aux.len(), 2);
    }

    #[test]
    fn test_build_config_override() {
        let config = test_parse_config(
            "[build]\noutput = \"public\"\nminify = false\naux = [\"img/favicon.ico\"]",
        );

        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(!config.build.minify);
        // untouched keys keep their defaults
        assert!(config.build.fingerprint);
        assert_eq!(config.build.aux, vec![PathBuf::from("img/favicon.ico")]);
    }

    #[test]
    fn test_asset_prefix() {
        let config = test_parse_config("[build]\nassets = \"static/media\"");
        assert_eq!(config.build.asset_prefix(), "media");

        let config = test_parse_config("");
        assert_eq!(config.build.asset_prefix(), "assets");
    }

    #[test]
    fn test_output_dirs() {
        let config = test_parse_config("");
        assert_eq!(config.build.asset_output_dir(), PathBuf::from("dist/assets"));
        assert_eq!(config.build.img_output_dir(), PathBuf::from("dist/assets/img"));
    }
}
