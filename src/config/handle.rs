//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement.
//! This enables hot-reloading of `sitekit.toml` during watch mode.

use crate::config::SiteConfig;
use anyhow::Result;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

/// Global stamp of the current config file content.
static CONFIG_STAMP: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

#[inline]
pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

/// Reload config from disk if content changed.
///
/// Returns `Ok(true)` if config was updated, `Ok(false)` if unchanged.
pub fn reload_config() -> Result<bool> {
    use std::fs;

    let c = cfg();
    let cli = c.cli.expect("CLI should be set during initialization");

    let content = fs::read_to_string(&c.config_path)?;
    let new_stamp = content_stamp(&content);

    let old_stamp = CONFIG_STAMP.load(std::sync::atomic::Ordering::Relaxed);
    if new_stamp == old_stamp {
        return Ok(false);
    }

    let new_config = SiteConfig::load(cli)?;
    CONFIG.store(Arc::new(new_config));
    CONFIG_STAMP.store(new_stamp, std::sync::atomic::Ordering::Relaxed);

    Ok(true)
}

#[inline]
pub fn init_config(config: SiteConfig) -> Arc<SiteConfig> {
    use std::fs;

    if config.config_path.exists()
        && let Ok(content) = fs::read_to_string(&config.config_path)
    {
        CONFIG_STAMP.store(
            content_stamp(&content),
            std::sync::atomic::Ordering::Relaxed,
        );
    }

    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}

/// Collapse file content to a u64 change stamp (first 8 bytes of blake3).
fn content_stamp(content: &str) -> u64 {
    let hash = blake3::hash(content.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
