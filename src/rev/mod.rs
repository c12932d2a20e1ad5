//! Asset fingerprinting and reference rewriting.
//!
//! Pipeline order matters: `revision_assets` renames files and builds the
//! manifest, `rewrite_references` patches text references to the new names,
//! and `rewrite_icon_references` fixes the structured icon collateral the
//! text pass cannot handle. The manifest flows through these steps as a
//! value; `rev-manifest.json` on disk is an artifact for external consumers.

mod icons;
mod manifest;
mod revision;
mod rewrite;

pub use icons::rewrite_icon_references;
pub use manifest::{MANIFEST_NAME, RevManifest};
pub use revision::revision_assets;
pub use rewrite::{replace_path_tokens, rewrite_references};
