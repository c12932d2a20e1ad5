//! MIME type detection for the development server.

#![allow(dead_code)]

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const WEBMANIFEST: &str = "application/manifest+json";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
}

/// Guess MIME type from file extension.
///
/// Returns a full MIME type string suitable for HTTP Content-Type header.
pub fn from_path(path: &Path) -> &'static str {
    from_extension(path.extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        // Web / Text
        Some("html" | "htm") => types::HTML,
        Some("css") => types::CSS,
        Some("js" | "mjs") => types::JAVASCRIPT,
        Some("json") => types::JSON,
        Some("xml") => types::XML,
        Some("webmanifest") => types::WEBMANIFEST,
        Some("txt") => types::PLAIN,

        // Images
        Some("svg") => types::SVG,
        Some("png" | "apng") => types::PNG,
        Some("jpg" | "jpeg" | "jfif" | "pjpeg" | "pjp") => types::JPEG,
        Some("gif") => types::GIF,
        Some("webp") => types::WEBP,
        Some("avif") => types::AVIF,
        Some("ico") => types::ICO,

        // Fonts
        Some("woff") => types::WOFF,
        Some("woff2") => types::WOFF2,
        Some("ttf") => types::TTF,
        Some("otf") => types::OTF,

        _ => types::OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("index.html")), types::HTML);
        assert_eq!(from_path(&PathBuf::from("style.css")), types::CSS);
        assert_eq!(from_path(&PathBuf::from("app.a1b2c3d4.js")), types::JAVASCRIPT);
        assert_eq!(from_path(&PathBuf::from("logo.png")), types::PNG);
        assert_eq!(
            from_path(&PathBuf::from("site.webmanifest")),
            types::WEBMANIFEST
        );
        assert_eq!(from_path(&PathBuf::from("unknown.xyz")), types::OCTET_STREAM);
    }

    #[test]
    fn test_from_extension_none() {
        assert_eq!(from_extension(None), types::OCTET_STREAM);
    }
}
