//! nullboard-backup/crates/nb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the backup receiver.

pub mod bucket;
pub mod config;
pub mod error;
pub mod models;
pub mod naming;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use config::BackupConfig;
pub use error::*;
pub use models::*;
pub use service::{BackupService, SaveReport};
pub use traits::*;
