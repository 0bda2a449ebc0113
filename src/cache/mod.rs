//! # Cache Module
//!
//! Per-subject snapshot persistence on local disk.
//!
//! - [`storage`] - reads and writes newline-delimited record snapshots
//! - [`constants`] - file and directory names

pub mod constants;
pub mod storage;

pub use storage::{CacheStorage, CachedSubject};
