use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sightline_core::config::ClientConfig;

/// Loads `explicit` if given, otherwise the default file plus environment
/// overrides.
pub fn load(explicit: Option<&Path>) -> Result<ClientConfig> {
    match explicit {
        Some(path) => ClientConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ClientConfig::load().context("Failed to load configuration"),
    }
}

pub fn path(explicit: Option<&Path>) -> Result<()> {
    let path: PathBuf = match explicit {
        Some(path) => path.to_path_buf(),
        None => ClientConfig::default_path()?,
    };
    println!("{}", path.display());
    Ok(())
}

pub fn show(config: &ClientConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    if config.dialogue.is_none() {
        println!("# [dialogue] is not configured; `sightline widget` will be unavailable");
    }
    Ok(())
}
