//! Sitekit - a static asset build pipeline with fingerprinting and live reload.

#![allow(dead_code)]

mod asset;
mod cli;
mod config;
mod core;
mod logger;
mod reload;
mod rev;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{SiteConfig, init_config};
use core::BuildMode;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(SiteConfig::load(cli)?);

    // Environment-selected mode (SITEKIT_ENV) is read for parity with
    // NODE_ENV-style pipelines; each command pins its own mode below.
    debug!("init"; "environment requests {} mode", BuildMode::from_env().label());

    match &cli.command {
        Commands::Build { .. } => {
            cli::build::build_site(BuildMode::PRODUCTION, &config).map(|_| ())
        }
        Commands::Serve { .. } => serve_site(&config),
    }
}

/// Build once, then serve the output tree with watch + live reload.
fn serve_site(config: &SiteConfig) -> Result<()> {
    cli::build::build_site(BuildMode::DEVELOPMENT, config)?;
    cli::serve::serve(config)
}
