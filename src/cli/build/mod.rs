//! Build orchestration.
//!
//! Pipeline phases:
//! - **Clean** - remove the previous output tree
//! - **Transform** - css/js/images/aux/html stages in parallel
//! - **Revision** - fingerprint output assets into the manifest
//! - **Rewrite** - patch text references, then the icon collateral
//! - **Finalize** - summary logging

mod stages;

pub use stages::Stage;

use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::config::SiteConfig;
use crate::core::BuildMode;
use crate::log;
use crate::rev;

/// Counters from one build run.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildSummary {
    /// Files written by the transform stages.
    pub files: usize,
    /// Files renamed by the revisioner.
    pub revisioned: usize,
    /// Files patched by the reference rewriter.
    pub rewritten: usize,
}

/// Build the whole output tree.
///
/// Stages run in dependency order: clean, then the five transforms (parallel,
/// they own disjoint subtrees), then the fingerprint passes which need the
/// finished tree. The first failing stage aborts the build.
pub fn build_site(mode: BuildMode, config: &SiteConfig) -> Result<BuildSummary> {
    let started = Instant::now();
    crate::debug!("build"; "{} build starting", mode.label());

    clean_output(config)?;

    let counts = Stage::ALL
        .par_iter()
        .map(|stage| stage.run(config))
        .collect::<Result<Vec<_>>>()?;

    let mut summary = BuildSummary {
        files: counts.iter().sum(),
        ..BuildSummary::default()
    };

    if config.build.fingerprint {
        let manifest = rev::revision_assets(&config.build.output)?;
        manifest.write(&config.build.output)?;
        summary.revisioned = manifest.len();
        summary.rewritten = rev::rewrite_references(&manifest, &config.build.output)?;
        rev::rewrite_icon_references(&manifest, config)?;
    }

    log!(
        "build";
        "{} files, {} fingerprinted, {} rewritten in {}ms",
        summary.files,
        summary.revisioned,
        summary.rewritten,
        started.elapsed().as_millis()
    );

    Ok(summary)
}

/// Remove the previous output tree and start fresh.
fn clean_output(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;
    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;
    Ok(())
}
