// src/commands/mod.rs
//! Command handlers for the olx-convert CLI

mod convert;
mod inspect;
pub mod progress;

pub use convert::cmd_convert;
pub use inspect::cmd_inspect;

use anyhow::{Context, Result};
use olx_convert::ConvertConfig;
use std::path::Path;

/// Load the configuration file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<ConvertConfig> {
    match path {
        Some(path) => ConvertConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(ConvertConfig::default()),
    }
}
