//! Build mode configuration for production/development builds.

/// Environment variable consulted by `BuildMode::from_env`.
pub const MODE_ENV_VAR: &str = "SITEKIT_ENV";

/// Build mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Whether this is a production build.
    pub production: bool,
}

impl BuildMode {
    /// Production mode: one-shot optimized build.
    pub const PRODUCTION: Self = Self { production: true };

    /// Development mode: build backing the serve/watch loop.
    pub const DEVELOPMENT: Self = Self { production: false };

    /// Mode requested by the environment (`SITEKIT_ENV=production`).
    ///
    /// Read at startup for parity with NODE_ENV-style pipelines; the CLI
    /// commands each pin their mode explicitly.
    pub fn from_env() -> Self {
        match std::env::var(MODE_ENV_VAR) {
            Ok(v) if v.eq_ignore_ascii_case("production") => Self::PRODUCTION,
            _ => Self::DEVELOPMENT,
        }
    }

    /// Check if this is development mode.
    #[inline]
    pub const fn is_dev(&self) -> bool {
        !self.production
    }

    pub const fn label(&self) -> &'static str {
        if self.production {
            "production"
        } else {
            "development"
        }
    }
}
