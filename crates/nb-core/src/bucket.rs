//! # Time Bucketing
//!
//! Frequent saves from the same client are grouped into coarse
//! `date/hour/ten-minute` directories so fan-out stays low.

use chrono::{NaiveDateTime, Timelike};
use std::path::PathBuf;

/// `2024-03-15 14:47` -> `2024-03-15/14/40`. Minutes 0-9 map to `0`.
pub fn time_to_bucket_path(at: &NaiveDateTime) -> PathBuf {
    let minutes = (at.minute() / 10) * 10;
    PathBuf::from(at.format("%Y-%m-%d").to_string())
        .join(at.format("%H").to_string())
        .join(minutes.to_string())
}

/// Date embedded in revisioned file names.
pub fn time_to_datestamp(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%d").to_string()
}
