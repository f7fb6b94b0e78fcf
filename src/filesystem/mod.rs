// src/filesystem/mod.rs

//! Filesystem helpers
//!
//! - Path sanitization for archive entries and static asset references
//! - The hash-bucketed file store written into every backup

pub mod path;
mod store;

pub use store::{FileStore, StoreOutcome};
