//! Image optimization.
//!
//! Raster formats are re-encoded with the `image` crate, SVG is minified via
//! usvg. The optimized bytes are used only when smaller than the input, so a
//! well-compressed source never grows.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

/// JPEG re-encode quality.
const JPEG_QUALITY: u8 = 80;

/// Optimize image bytes for the given path.
///
/// Returns `None` when the format is passed through untouched, when the file
/// fails to decode, or when the optimized output would be larger than the
/// input.
pub fn optimize(path: &Path, data: &[u8]) -> Option<Vec<u8>> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let optimized = match ext.as_str() {
        "png" => reencode_png(data)?,
        "jpg" | "jpeg" | "jfif" | "pjpeg" | "pjp" => reencode_jpeg(data)?,
        "svg" => minify_svg(data)?,
        // gif/webp/avif/apng pass through; re-encoding them loses animation
        // frames or trades one lossy generation for another
        _ => return None,
    };

    (optimized.len() < data.len()).then_some(optimized)
}

fn reencode_png(data: &[u8]) -> Option<Vec<u8>> {
    let img = image::load_from_memory(data).ok()?;
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut out),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    img.write_with_encoder(encoder).ok()?;
    Some(out)
}

fn reencode_jpeg(data: &[u8]) -> Option<Vec<u8>> {
    let img = image::load_from_memory(data).ok()?;
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), JPEG_QUALITY);
    img.write_with_encoder(encoder).ok()?;
    Some(out)
}

/// Minify SVG by reparsing through usvg and printing without indentation.
fn minify_svg(data: &[u8]) -> Option<Vec<u8>> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default()).ok()?;
    let options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };
    Some(tree.to_string(&options).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension_passthrough() {
        assert!(optimize(Path::new("anim.gif"), b"GIF89a...").is_none());
        assert!(optimize(Path::new("noext"), b"data").is_none());
    }

    #[test]
    fn test_invalid_data_passthrough() {
        assert!(optimize(Path::new("broken.png"), b"not a png").is_none());
        assert!(optimize(Path::new("broken.svg"), b"<not-svg").is_none());
    }

    #[test]
    fn test_svg_shrinks_padded_source() {
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\">\n\
             <!-- {} -->\n\
             \u{20}   <rect width=\"10\" height=\"10\" fill=\"#f00\"/>\n\
             </svg>",
            "padding ".repeat(100)
        );
        let out = optimize(Path::new("icon.svg"), svg.as_bytes()).unwrap();
        assert!(out.len() < svg.len());
        assert!(String::from_utf8(out).unwrap().starts_with("<svg"));
    }

    #[test]
    fn test_png_never_grows() {
        // encode a small image with no compression, then optimize it
        let img = image::DynamicImage::new_rgba8(16, 16);
        let mut source = Vec::new();
        let encoder = PngEncoder::new_with_quality(
            Cursor::new(&mut source),
            CompressionType::Fast,
            FilterType::NoFilter,
        );
        img.write_with_encoder(encoder).unwrap();

        if let Some(out) = optimize(Path::new("blank.png"), &source) {
            assert!(out.len() < source.len());
            assert!(image::load_from_memory(&out).is_ok());
        }
    }
}
