// src/error.rs

//! Error types for the conversion pipeline
//!
//! Every stage (parse, build, export) fails fast: errors propagate up to the
//! top-level conversion call and abort the whole run.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or schema-violating source document
    #[error("Malformed source document {path}: {message}")]
    StructuralParse { path: PathBuf, message: String },

    /// A child link or static asset points to a file that does not exist
    #[error("Missing {kind} referenced at {path}")]
    MissingReference { kind: String, path: PathBuf },

    /// Reference edge with a kind outside the known enumeration
    #[error("Invalid reference kind: {0}")]
    InvalidReferenceKind(String),

    /// Content-addressed store corruption (collision or short copy)
    #[error("Content integrity failure for {hash}: {message}")]
    ContentIntegrity { hash: String, message: String },

    /// Misuse of the document writer
    #[error("Document writer state error: {0}")]
    WriterState(String),

    /// Data set on an entity id that was never allocated
    #[error("Entity {entity_type}:{id} was never allocated")]
    UnallocatedEntity { entity_type: String, id: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("XML error in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Archive entry escaping the extraction root
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Restore failed: {0}")]
    Restore(String),
}

impl Error {
    /// Shorthand for a structural parse failure in `path`
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StructuralParse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn missing(kind: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingReference {
            kind: kind.into(),
            path: path.into(),
        }
    }

    pub fn xml(path: impl Into<PathBuf>, source: impl Into<quick_xml::Error>) -> Self {
        Self::Xml {
            path: path.into(),
            source: source.into(),
        }
    }
}
