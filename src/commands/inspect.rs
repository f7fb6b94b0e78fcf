// src/commands/inspect.rs

//! Inspect command - build the backup model and print what it holds

use anyhow::{Context, Result};
use olx_convert::{ConvertConfig, SilentProgress, entity_counts, inspect};
use std::path::Path;

pub fn cmd_inspect(archive: &Path, config: &ConvertConfig) -> Result<()> {
    let (course_name, model) = inspect(archive, config, &SilentProgress::new())
        .with_context(|| format!("Failed to read {}", archive.display()))?;

    println!("Course: {}", course_name);
    for (entity_type, count) in entity_counts(&model) {
        println!("  {:<22} {}", entity_type.as_str(), count);
    }
    println!("  {:<22} {}", "references", model.refs.len());
    Ok(())
}
