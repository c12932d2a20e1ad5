//! Generic reference rewriting across emitted text files.
//!
//! Every reference-bearing output file is patched so manifest keys point at
//! their fingerprinted names. Matching is path-token aware rather than raw
//! substring: a key only matches where it stands as a complete path, which
//! keeps a short filename from corrupting a longer unrelated one.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::asset::{self, kind::AssetKind};
use crate::debug;

use super::{MANIFEST_NAME, RevManifest};

/// Rewrite references to fingerprinted assets under the output root.
///
/// Files are written back only when their text changed. Running the pass a
/// second time is a no-op: after the first run no manifest key appears as an
/// intact path token anymore. Returns the number of files rewritten.
pub fn rewrite_references(manifest: &RevManifest, output_root: &Path) -> Result<usize> {
    if manifest.is_empty() {
        return Ok(0);
    }

    let mut changed = 0;
    for path in asset::collect_files(output_root) {
        if !AssetKind::from_path(&path).holds_references() {
            continue;
        }
        // The manifest itself records original paths as keys; rewriting it
        // would destroy the mapping.
        if path.file_name().is_some_and(|n| n == MANIFEST_NAME) {
            continue;
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut text = content;
        let mut touched = false;
        for (original, revisioned) in manifest.iter() {
            if let Cow::Owned(patched) = replace_path_tokens(&text, original, revisioned) {
                text = patched;
                touched = true;
            }
        }

        if touched {
            fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!("rewrite"; "{}", path.display());
            changed += 1;
        }
    }

    Ok(changed)
}

/// Replace occurrences of `from` with `to` where `from` stands as a complete
/// path token.
///
/// `/assets/img/logo.png` matches for key `assets/img/logo.png`;
/// `assets/img/logo.png.bak` and `my-logo.png` (for key `logo.png`) do not.
/// Returns `Cow::Borrowed` when nothing matched.
pub fn replace_path_tokens<'a>(text: &'a str, from: &str, to: &str) -> Cow<'a, str> {
    if from.is_empty() || !text.contains(from) {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut replaced = false;

    while let Some(pos) = rest.find(from) {
        let (head, tail) = rest.split_at(pos);
        let after = &tail[from.len()..];
        // For a match at the start of `rest` the preceding char lives in the
        // text emitted so far.
        let before = head
            .chars()
            .next_back()
            .or_else(|| result.chars().next_back());

        result.push_str(head);
        if is_token_boundary(before, after.chars().next()) {
            result.push_str(to);
            replaced = true;
        } else {
            result.push_str(from);
        }
        rest = after;
    }
    result.push_str(rest);

    if replaced {
        Cow::Owned(result)
    } else {
        Cow::Borrowed(text)
    }
}

/// A preceding `/` is fine (absolute references); any other path character
/// means the match extends a longer token. A following `/` would make the
/// key a directory prefix of a longer path, so it also blocks the match.
fn is_token_boundary(before: Option<char>, after: Option<char>) -> bool {
    let starts_clean = !before.is_some_and(is_path_char);
    let ends_clean = !after.is_some_and(|c| is_path_char(c) || c == '/');
    starts_clean && ends_clean
}

/// Characters that continue a path token.
fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}
