// src/backup/mod.rs

//! Target model: a Moodle 2 course backup held in memory
//!
//! - `pool`: typed entities with per-type ids
//! - `refs`: owner to dependency edges, serialized as `inforef.xml`
//! - `builder`: reshapes a `SourceTree` into entities and edges
//! - `files`: static assets to file entities
//!
//! Everything here belongs to one conversion run. The builder takes the
//! model by value and hands it back once the course is built; the exporter
//! only reads it.

mod builder;
pub mod content;
pub mod context;
pub mod entities;
pub mod files;
mod pool;
mod refs;

pub use builder::{BackupModel, Builder, build_model};
pub use entities::{Entity, EntityType, ModuleKind, PoolEntity};
pub use files::{FileArea, FileCollector};
pub use pool::EntityPool;
pub use refs::{RefKind, RefManager};
