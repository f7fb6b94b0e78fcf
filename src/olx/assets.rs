// src/olx/assets.rs

//! `policies/assets.json`: the course's static asset manifest

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// One manifest entry; edX writes many more keys, only these matter here
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AssetEntry {
    /// Location under `static/` when it differs from the asset name
    #[serde(default)]
    pub import_path: Option<String>,
    #[serde(default, rename = "contentType")]
    pub content_type: Option<String>,
}

/// Asset name to entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetManifest {
    entries: BTreeMap<String, AssetEntry>,
}

impl AssetManifest {
    /// Load the manifest; a course without one simply has no known assets
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("No asset manifest at {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        let entries: BTreeMap<String, AssetEntry> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&AssetEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Path relative to `static/` holding the bytes of `name`
    pub fn source_path<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries
            .get(name)
            .and_then(|e| e.import_path.as_deref())
            .filter(|p| !p.is_empty())
            .unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
