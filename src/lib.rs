// src/lib.rs

//! OLX to Moodle course converter
//!
//! Turns an edX OLX course export into a Moodle 2 course backup that Moodle
//! can restore.
//!
//! # Architecture
//!
//! - Parse: OLX documents into an arena-backed `SourceTree`
//! - Build: the tree reshaped into typed entities (`EntityPool`) and
//!   dependency edges (`RefManager`), with static assets registered as files
//! - Export: the model written as a backup directory with a
//!   content-addressed `files/` store
//!
//! Each stage fails fast; one conversion run owns all of its state.

pub mod archive;
pub mod backup;
pub mod config;
mod error;
pub mod export;
pub mod filesystem;
pub mod hash;
pub mod olx;
pub mod pipeline;
pub mod progress;
pub mod restore;

pub use backup::{BackupModel, Builder, EntityPool, EntityType, ModuleKind, RefKind, RefManager, build_model};
pub use config::ConvertConfig;
pub use error::{Error, Result};
pub use export::{ExportReport, Exporter, export_backup};
pub use hash::{Hash, HashAlgorithm, Hasher};
pub use olx::{OlxParser, SourceTree, parse_course};
pub use pipeline::{ConversionReport, convert, entity_counts, inspect};
pub use progress::{
    CallbackProgress, ConversionPhase, LogProgress, PhaseProgress, ProgressEvent, ProgressTracker,
    SilentProgress,
};
pub use restore::{CommandRestorer, CourseRestorer};
