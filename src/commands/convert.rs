// src/commands/convert.rs

//! Convert command - OLX export to Moodle backup
//!
//! On any failure the partially written backup directory is removed, so a
//! failed run never leaves something that looks like a usable backup.

use super::progress::CliProgress;
use anyhow::{Context, Result};
use olx_convert::archive::pack_mbz;
use olx_convert::{CommandRestorer, ConvertConfig, CourseRestorer, LogProgress, ProgressTracker, convert};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default output: `<archive stem>-backup` next to the input
fn default_output(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "course".to_string());
    let stem = name
        .trim_end_matches(".tar.gz")
        .trim_end_matches(".tgz")
        .trim_end_matches(".tar")
        .trim_end_matches('/');
    archive.with_file_name(format!("{}-backup", stem))
}

/// Progress as log lines under `--verbose`, a terminal bar otherwise
fn progress_tracker(verbose: bool) -> Box<dyn ProgressTracker> {
    if verbose {
        Box::new(LogProgress::new("convert"))
    } else {
        Box::new(CliProgress::new())
    }
}

pub fn cmd_convert(
    archive: &Path,
    output: Option<PathBuf>,
    mbz: Option<PathBuf>,
    restore: bool,
    config: &ConvertConfig,
    verbose: bool,
) -> Result<()> {
    let output = output.unwrap_or_else(|| default_output(archive));
    if output.exists() {
        anyhow::bail!("Output directory {} already exists", output.display());
    }

    let progress = progress_tracker(verbose);

    let report = match convert(archive, &output, config, progress.as_ref()) {
        Ok(report) => report,
        Err(e) => {
            progress.finish_with_error(&e.to_string());
            discard_output(&output);
            return Err(e).with_context(|| format!("Failed to convert {}", archive.display()));
        }
    };

    info!(
        "{}: {} sections, {} activities, {} files stored ({} deduplicated)",
        report.course_name,
        report.export.sections,
        report.export.activities,
        report.export.files.copied,
        report.export.files.deduplicated
    );

    if let Some(mbz) = &mbz {
        let checksum = pack_mbz(report.output(), mbz)
            .with_context(|| format!("Failed to pack {}", mbz.display()))?;
        println!("Packed backup: {} ({} {})", mbz.display(), checksum.algorithm, checksum);
    }

    if restore {
        let restorer = CommandRestorer::from_config(&config.restore)?;
        match restorer.restore(report.output()) {
            Ok(course_id) => println!("Restored course: {}", course_id),
            Err(e) => {
                discard_output(&output);
                return Err(e).context("Restore failed");
            }
        }
    } else {
        println!("{}", report.output().display());
    }

    Ok(())
}

fn discard_output(output: &Path) {
    if output.exists()
        && let Err(e) = fs::remove_dir_all(output)
    {
        warn!("Could not remove partial output {}: {}", output.display(), e);
    }
}
