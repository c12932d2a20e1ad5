//! Asset classification by file extension.

use std::path::Path;

/// Image extensions handled by the image stage.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "apng", "avif", "gif", "jfif", "jpeg", "jpg", "pjp", "pjpeg", "png", "svg", "webp",
];

/// Kinds of pipeline files, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Css,
    Js,
    Image,
    Html,
    Json,
    WebManifest,
    Xml,
    Other,
}

impl AssetKind {
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Self::Other;
        };

        match ext.to_ascii_lowercase().as_str() {
            "css" => Self::Css,
            "js" => Self::Js,
            "html" | "htm" => Self::Html,
            "json" => Self::Json,
            "webmanifest" => Self::WebManifest,
            "xml" => Self::Xml,
            e if IMAGE_EXTENSIONS.contains(&e) => Self::Image,
            _ => Self::Other,
        }
    }

    /// Kinds that get a content hash embedded in their filename.
    pub const fn is_fingerprinted(self) -> bool {
        matches!(
            self,
            Self::Css | Self::Js | Self::Image | Self::Json | Self::WebManifest | Self::Xml
        )
    }

    /// Kinds whose text may reference other assets by path.
    pub const fn holds_references(self) -> bool {
        matches!(
            self,
            Self::Html | Self::Css | Self::Js | Self::Json | Self::WebManifest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AssetKind::from_path(Path::new("a/style.css")), AssetKind::Css);
        assert_eq!(AssetKind::from_path(Path::new("app.js")), AssetKind::Js);
        assert_eq!(AssetKind::from_path(Path::new("index.html")), AssetKind::Html);
        assert_eq!(AssetKind::from_path(Path::new("logo.PNG")), AssetKind::Image);
        assert_eq!(AssetKind::from_path(Path::new("icon.svg")), AssetKind::Image);
        assert_eq!(
            AssetKind::from_path(Path::new("site.webmanifest")),
            AssetKind::WebManifest
        );
        assert_eq!(
            AssetKind::from_path(Path::new("browserconfig.xml")),
            AssetKind::Xml
        );
        assert_eq!(AssetKind::from_path(Path::new("notes.txt")), AssetKind::Other);
        assert_eq!(AssetKind::from_path(Path::new("Makefile")), AssetKind::Other);
    }

    #[test]
    fn test_fingerprinted_set() {
        // Revisioned filename keeps its kind (the hash sits before the extension)
        assert!(AssetKind::from_path(Path::new("style.a1b2c3d4.css")).is_fingerprinted());
        assert!(AssetKind::from_path(Path::new("logo.png")).is_fingerprinted());
        assert!(AssetKind::from_path(Path::new("site.webmanifest")).is_fingerprinted());
        assert!(!AssetKind::from_path(Path::new("index.html")).is_fingerprinted());
        assert!(!AssetKind::from_path(Path::new("notes.txt")).is_fingerprinted());
    }

    #[test]
    fn test_reference_bearing_set() {
        assert!(AssetKind::Html.holds_references());
        assert!(AssetKind::Css.holds_references());
        assert!(AssetKind::Js.holds_references());
        assert!(AssetKind::Json.holds_references());
        assert!(AssetKind::WebManifest.holds_references());
        assert!(!AssetKind::Xml.holds_references());
        assert!(!AssetKind::Image.holds_references());
    }
}
