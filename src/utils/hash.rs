//! Content fingerprinting for cache busting.
//!
//! Fingerprints are blake3 hashes truncated to 8 hex characters. Stable
//! across runs for unchanged content, so revisioned filenames (e.g.
//! `style.a1b2c3d4.css`) are reproducible build to build.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Number of hex characters kept in a fingerprint.
pub const FINGERPRINT_LEN: usize = 8;

/// Compute the fingerprint of a byte slice.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let hash = blake3::hash(data.as_ref());
    hex::encode(&hash.as_bytes()[..FINGERPRINT_LEN / 2])
}

/// Compute the fingerprint of a file's contents (streaming).
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let hash = hasher.finalize();
    Ok(hex::encode(&hash.as_bytes()[..FINGERPRINT_LEN / 2]))
}
