//! # Configuration
//!
//! Built once at startup from the environment (after `.env` is loaded) and
//! handed to the plugins and service by value.

use crate::error::{AppError, Result};
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 20002;
pub const DEFAULT_KEEP_REVISIONS: usize = 5;
/// Boards with many notes easily outgrow actix's 256 KiB default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    /// Root of the backup tree (`BACKUP_DIR`).
    pub backup_root: PathBuf,
    /// Verbose logging (`DEBUG`).
    pub debug: bool,
    pub bind_addr: String,
    pub port: u16,
    /// Size of every revision family after pruning.
    pub keep_revisions: usize,
    /// Largest request body accepted (`BACKUP_MAX_BODY`), in bytes.
    pub max_body_bytes: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_root: PathBuf::from("."),
            debug: false,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            keep_revisions: DEFAULT_KEEP_REVISIONS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl BackupConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backup_root = get("BACKUP_DIR").map(PathBuf::from).unwrap_or(defaults.backup_root);
        let debug = get("DEBUG").is_some_and(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"));
        let bind_addr = get("BACKUP_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let port = match get("BACKUP_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("BACKUP_PORT is not a port number: {raw:?}")))?,
            None => defaults.port,
        };

        let keep_revisions = match get("BACKUP_KEEP_REVISIONS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(AppError::Config(format!(
                        "BACKUP_KEEP_REVISIONS must be a positive integer: {raw:?}"
                    )))
                }
            },
            None => defaults.keep_revisions,
        };

        let max_body_bytes = match get("BACKUP_MAX_BODY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(AppError::Config(format!(
                        "BACKUP_MAX_BODY must be a positive byte count: {raw:?}"
                    )))
                }
            },
            None => defaults.max_body_bytes,
        };

        Ok(Self {
            backup_root,
            debug,
            bind_addr,
            port,
            keep_revisions,
            max_body_bytes,
        })
    }

    /// True when backups would land in the working directory.
    pub fn uses_working_dir(&self) -> bool {
        self.backup_root.as_os_str().is_empty() || self.backup_root == PathBuf::from(".")
    }
}
