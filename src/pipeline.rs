// src/pipeline.rs

//! One conversion run: decompress, parse, build, export
//!
//! The stages run strictly in sequence. Any error aborts the run; the caller
//! is expected to discard the partially written output directory.

use crate::archive;
use crate::backup::{BackupModel, EntityType, build_model};
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::export::{ExportReport, Exporter};
use crate::olx::{self, NodeKind};
use crate::progress::{ConversionPhase, PhaseProgress, ProgressTracker};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Outcome of a successful conversion
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub course_name: String,
    pub export: ExportReport,
}

impl ConversionReport {
    pub fn output(&self) -> &Path {
        &self.export.output
    }
}

/// Course tree on disk, extracted into a temporary directory when the input
/// was an archive
struct CourseSource {
    root: PathBuf,
    _extracted: Option<TempDir>,
}

fn open_source(input: &Path, progress: &dyn ProgressTracker) -> Result<CourseSource> {
    if input.is_dir() {
        return Ok(CourseSource {
            root: archive::find_course_root(input)?,
            _extracted: None,
        });
    }

    progress.set_phase(ConversionPhase::Decompress, 1);
    let extracted = TempDir::new()?;
    let root = archive::decompress(input, extracted.path())?;
    progress.increment(1);
    debug!("Course root at {}", root.display());

    Ok(CourseSource {
        root,
        _extracted: Some(extracted),
    })
}

fn parse_and_build(
    source: &CourseSource,
    config: &ConvertConfig,
    progress: &dyn ProgressTracker,
) -> Result<(String, BackupModel)> {
    progress.set_phase(ConversionPhase::Parse, 1);
    let tree = olx::parse_course(&source.root)?;
    progress.increment(1);

    progress.set_phase(ConversionPhase::Build, tree.count(NodeKind::Chapter) as u64);
    let model = build_model(&tree, &source.root, config, progress)?;

    Ok((tree.course().display_name.clone(), model))
}

/// Convert the OLX course at `input` (archive or directory) into a Moodle
/// backup directory at `output`
pub fn convert(
    input: &Path,
    output: &Path,
    config: &ConvertConfig,
    progress: &dyn ProgressTracker,
) -> Result<ConversionReport> {
    info!("Converting {} into {}", input.display(), output.display());

    // Holds the extracted tree until the file store has been filled
    let source = open_source(input, progress)?;
    let (course_name, model) = parse_and_build(&source, config, progress)?;

    let exporter = Exporter::new(&model, output, config)?;
    progress.set_phase(ConversionPhase::Export, exporter.unit_count());
    let export = exporter.export(progress)?;

    progress.finish_with_message(&format!("Converted {}", course_name));
    Ok(ConversionReport { course_name, export })
}

/// Parse and build only; returns the course name and the model
pub fn inspect(
    input: &Path,
    config: &ConvertConfig,
    progress: &dyn ProgressTracker,
) -> Result<(String, BackupModel)> {
    let source = open_source(input, progress)?;
    let built = parse_and_build(&source, config, progress)?;
    progress.finish_with_message("Built backup model");
    Ok(built)
}

/// Entity counts per type, skipping empty types
pub fn entity_counts(model: &BackupModel) -> Vec<(EntityType, usize)> {
    EntityType::ALL
        .into_iter()
        .map(|t| (t, model.pool.count(t)))
        .filter(|(_, count)| *count > 0)
        .collect()
}
