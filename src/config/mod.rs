//! Configuration management for `sitekit.toml`.
//!
//! | Section   | Purpose                                       |
//! |-----------|-----------------------------------------------|
//! | `[build]` | Source/output paths, stage toggles            |
//! | `[serve]` | Development server (interface, port, watch)   |
//!
//! The config file is discovered by upward search from the working
//! directory; its parent directory becomes the project root, and all
//! relative path settings resolve against it.

mod error;
mod handle;
pub mod section;

pub use error::ConfigError;
pub use handle::{cfg, init_config, reload_config};
pub use section::{BuildConfig, ServeConfig};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands};
use crate::log;
use crate::utils::path::normalize_path;

/// Root configuration structure representing sitekit.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build settings
    pub build: BuildConfig,

    /// Development server settings
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file. The project root is
    /// determined by the config file's parent directory.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            log!(
                "error";
                "Config file '{}' not found in this or any parent directory.",
                cli.config.display()
            );
            std::process::exit(1);
        };

        let mut config = Self::from_path(&config_path)?;
        config.cli = Some(cli);
        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;

        config.apply_cli_overrides(cli);
        config.resolve_paths();

        crate::logger::set_verbose(cli.build_args().verbose);
        Ok(config)
    }

    /// Parse a config file from disk.
    fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Fold CLI arguments over the file-based settings.
    fn apply_cli_overrides(&mut self, cli: &'static Cli) {
        if let Some(output) = &cli.output {
            self.build.output = output.clone();
        }

        let args = cli.build_args();
        if let Some(minify) = args.minify {
            self.build.minify = minify;
        }
        if let Some(images) = args.images {
            self.build.images = images;
        }
        if let Some(fingerprint) = args.fingerprint {
            self.build.fingerprint = fingerprint;
        }

        if let Commands::Serve {
            interface,
            port,
            watch,
            ..
        } = &cli.command
        {
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
            if let Some(watch) = watch {
                self.serve.watch = *watch;
            }
        }
    }

    /// Root-join and normalize the path settings.
    fn resolve_paths(&mut self) {
        self.build.assets = self.root_join(&self.build.assets);
        self.build.pages = self.root_join(&self.build.pages);
        self.build.output = self.root_join(&self.build.output);
    }

    /// Resolve a path against the project root (absolute paths pass through).
    pub fn root_join(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            normalize_path(&self.root.join(path))
        }
    }
}

/// Search upward from the working directory for the config file.
fn find_config_file(name: &Path) -> Option<PathBuf> {
    if name.is_absolute() {
        return name.is_file().then(|| name.to_path_buf());
    }

    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(normalize_path(&candidate));
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
pub(crate) fn test_parse_config(content: &str) -> SiteConfig {
    toml::from_str(content).expect("test config should parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_section_ignored() {
        // serde(default) + non-strict parsing: extra tables don't fail the load
        let config = test_parse_config("[future]\nkey = 1");
        assert_eq!(config.build.output, PathBuf::from("dist"));
    }

    #[test]
    fn test_root_join_relative() {
        let mut config = SiteConfig::default();
        config.root = PathBuf::from("/project");
        assert_eq!(
            config.root_join(Path::new("assets")),
            PathBuf::from("/project/assets")
        );
    }

    #[test]
    fn test_root_join_absolute() {
        let config = SiteConfig::default();
        assert_eq!(
            config.root_join(Path::new("/elsewhere/assets")),
            PathBuf::from("/elsewhere/assets")
        );
    }
}
