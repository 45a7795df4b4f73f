//! Acquisition configuration constants

/// Compression suffixes tried for every naming variant, in order.
/// `.gz` is the current default across the mirrors; `.Z` only survives on
/// legacy trees.
pub const DEFAULT_COMPRESSION_SUFFIXES: [&str; 2] = [".gz", ".Z"];

/// Suffix of the backup kept for the middle file of a stitch
pub const STITCH_BACKUP_SUFFIX: &str = ".orig";

/// SP3 data-block marker
pub const SP3_DATA_MARKER: &str = "* ";

/// SP3 end-of-file marker
pub const SP3_END_MARKER: &str = "EOF";

/// Name of the audit log written in the main data directory
pub const AUDIT_LOG_NAME: &str = "gnss_downloader.log";

/// Name of the lock file guarding a main data directory
pub const RUN_LOCK_NAME: &str = ".gnss_downloader.lock";

/// Interval between ultra-rapid product issues, in hours
pub const ULTRA_RAPID_STEP_HOURS: u32 = 6;

/// Interval between high-rate observation files, in minutes
pub const HIGHRATE_STEP_MINUTES: u32 = 15;

/// `from` keyword standing for every archived final provider of a kind
pub const ALL_PROVIDERS_KEYWORD: &str = "all";

/// `from` keyword standing for every MGEX provider of a kind
pub const ALL_MGEX_PROVIDERS_KEYWORD: &str = "all_m";

/// Variant of real-time stream products; never part of `all`
pub const REALTIME_VARIANT: &str = "realtime";

/// Length of a station code at the start of a discovered observation name
pub const STATION_CODE_LEN: usize = 4;
