// src/restore.rs

//! Hand a finished backup to Moodle
//!
//! Restoring into a live site is done by an external program, typically
//! Moodle's own CLI restore script. It receives the backup directory as its
//! last argument and prints the new course id on the last line of stdout.

use crate::config::RestoreConfig;
use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Turns a backup directory into a live course
pub trait CourseRestorer {
    /// Restore `backup_dir` and return the new course identifier
    fn restore(&self, backup_dir: &Path) -> Result<String>;
}

/// Restores by running a configured command line
#[derive(Debug, Clone)]
pub struct CommandRestorer {
    program: String,
    args: Vec<String>,
}

impl CommandRestorer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split the configured command on whitespace
    pub fn from_config(config: &RestoreConfig) -> Result<Self> {
        let command = config
            .command
            .as_deref()
            .ok_or_else(|| Error::Restore("no restore command configured".to_string()))?;

        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Restore("restore command is empty".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }
}

impl CourseRestorer for CommandRestorer {
    fn restore(&self, backup_dir: &Path) -> Result<String> {
        info!("Restoring {} with {}", backup_dir.display(), self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(backup_dir)
            .output()
            .map_err(|e| Error::Restore(format!("cannot run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Restore(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("Restore output: {}", stdout.trim());
        stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::Restore(format!("{} did not report a course id", self.program)))
    }
}
