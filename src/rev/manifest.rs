//! The revision manifest: original path → fingerprinted path.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Manifest filename written at the output root.
pub const MANIFEST_NAME: &str = "rev-manifest.json";

/// Mapping from original output-relative paths to their fingerprinted
/// counterparts, e.g. `assets/img/logo.png` → `assets/img/logo.3f2a9c1d.png`.
///
/// Keys use forward slashes regardless of platform, and the BTreeMap keeps
/// the persisted JSON deterministically ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevManifest {
    entries: BTreeMap<String, String>,
}

impl RevManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, original: impl Into<String>, revisioned: impl Into<String>) {
        self.entries.insert(original.into(), revisioned.into());
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Write the manifest as pretty JSON at the output root.
    ///
    /// An empty manifest still writes `{}` so downstream tooling can rely on
    /// the file existing after every build.
    pub fn write(&self, output_root: &Path) -> Result<()> {
        let path = output_root.join(MANIFEST_NAME);
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Load a previously written manifest. `Ok(None)` when the file is absent.
    pub fn load(output_root: &Path) -> Result<Option<Self>> {
        let path = output_root.join(MANIFEST_NAME);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let entries = serde_json::from_str(&content)
            .with_context(|| format!("invalid manifest {}", path.display()))?;
        Ok(Some(Self { entries }))
    }
}
