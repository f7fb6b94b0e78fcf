// src/config.rs

//! Conversion settings loaded from TOML
//!
//! # Example olx-convert.toml
//!
//! ```toml
//! log_level = "debug"
//!
//! [target]
//! moodle_version = 2020061500
//! moodle_release = "3.9"
//! wwwroot = "https://moodle.example.org"
//!
//! [course]
//! category_id = 4
//! category_name = "Imported"
//!
//! [convert]
//! discussions_as_forums = true
//!
//! [restore]
//! command = "php /srv/moodle/admin/cli/restore_backup.php --categoryid=4 --file"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub course: CourseConfig,

    #[serde(default)]
    pub convert: ConvertOptions,

    #[serde(default)]
    pub restore: RestoreConfig,
}

/// Identity of the Moodle site the backup claims to come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TargetConfig {
    pub moodle_version: u64,
    pub moodle_release: String,
    pub backup_version: u64,
    pub backup_release: String,
    pub wwwroot: String,
    /// Hashed (MD5) into `original_site_identifier_hash`
    pub site_identifier: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            moodle_version: 2020061500,
            moodle_release: "3.9".to_string(),
            backup_version: 2020061500,
            backup_release: "3.9".to_string(),
            wwwroot: "http://localhost".to_string(),
            site_identifier: "olx-convert".to_string(),
        }
    }
}

/// Course-level defaults for the generated course record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CourseConfig {
    pub category_id: u32,
    pub category_name: String,
    pub category_description: String,
    pub format: String,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            category_id: 1,
            category_name: "Miscellaneous".to_string(),
            category_description: String::new(),
            format: "topics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConvertOptions {
    /// Emit one forum per discussion instead of dropping discussions
    pub discussions_as_forums: bool,
}

/// External restore collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RestoreConfig {
    /// Command line run with the backup path appended as its last argument
    pub command: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            target: TargetConfig::default(),
            course: CourseConfig::default(),
            convert: ConvertOptions::default(),
            restore: RestoreConfig::default(),
        }
    }
}

impl ConvertConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}
