//! Constants for cache file and directory names

/// Directory created under the platform cache directory
pub const APP_DIR: &str = "reswirl";
/// Used when the platform reports no cache directory
pub const FALLBACK_CACHE_ROOT: &str = "reswirl-cache";

/// Extension of a cached snapshot (one JSON record per line)
pub const SNAPSHOT_EXTENSION: &str = "jsonl";
/// Extension of the in-progress file renamed over a snapshot
pub const TEMP_EXTENSION: &str = "jsonl.tmp";
