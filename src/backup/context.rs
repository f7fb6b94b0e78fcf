// src/backup/context.rs

//! Synthetic context ids and unique stamps
//!
//! The backup only needs internally consistent context ids; the restoring
//! site maps them onto its own.

use uuid::Uuid;

pub const SYSTEM_CONTEXT_ID: u32 = 1;
pub const COURSE_CONTEXT_ID: u32 = 100;
const MODULE_CONTEXT_BASE: u32 = 200;

/// `CONTEXT_COURSE`
pub const CONTEXT_LEVEL_COURSE: u32 = 50;
/// `CONTEXT_MODULE`
pub const CONTEXT_LEVEL_MODULE: u32 = 70;

/// Placeholder id of the restored course
pub const COURSE_ID: u32 = 2;

/// Context id of the module with global id `moduleid`
pub const fn module_context(moduleid: u32) -> u32 {
    MODULE_CONTEXT_BASE + moduleid
}

/// Unique stamps in Moodle's `host+time+random` form
#[derive(Debug, Clone)]
pub struct StampGenerator {
    host: String,
}

impl StampGenerator {
    /// Derive the host part from the site's web root
    pub fn new(wwwroot: &str) -> Self {
        let without_scheme = wwwroot.split_once("://").map_or(wwwroot, |(_, rest)| rest);
        let host = without_scheme
            .split(['/', ':'])
            .next()
            .filter(|h| !h.is_empty())
            .unwrap_or("localhost");
        Self { host: host.to_string() }
    }

    pub fn stamp(&self, now: i64) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!("{}+{}+{}", self.host, now, &random[..6])
    }
}
