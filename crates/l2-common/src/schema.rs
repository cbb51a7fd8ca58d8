//! Log format versioning and the field vocabulary shared by writer and reader.
//!
//! The write path validates records incrementally and the read path
//! re-validates whole columns; both draw their field names and closed
//! enumerations from this module so the two can never drift apart.

/// Format version stamped into `logger_info.json` for records that carry
/// `block_subtype`.
pub const LOG_FORMAT_VERSION: &str = "1.1";

/// Format version of logs written before `block_subtype` existed.
pub const LEGACY_LOG_FORMAT_VERSION: &str = "1.0";

pub const BLOCK_NUM: &str = "block_num";
pub const EXP_NUM: &str = "exp_num";
pub const WORKER_ID: &str = "worker_id";
pub const BLOCK_TYPE: &str = "block_type";
pub const BLOCK_SUBTYPE: &str = "block_subtype";
pub const TASK_NAME: &str = "task_name";
pub const TASK_PARAMS: &str = "task_params";
pub const EXP_STATUS: &str = "exp_status";
pub const TIMESTAMP: &str = "timestamp";

/// Standard record fields of the current format, in column order.
pub const STANDARD_FIELDS: &[&str] = &[
    BLOCK_NUM,
    EXP_NUM,
    WORKER_ID,
    BLOCK_TYPE,
    BLOCK_SUBTYPE,
    TASK_NAME,
    TASK_PARAMS,
    EXP_STATUS,
    TIMESTAMP,
];

/// Derived column restored during aggregation; never written by a logger.
pub const REGIME_NUM: &str = "regime_num";

/// Allowed `block_type` values.
pub const BLOCK_TYPES: &[&str] = &["train", "test"];

/// Allowed `block_subtype` values.
pub const BLOCK_SUBTYPES: &[&str] = &["wake", "sleep"];

/// Allowed `exp_status` values.
pub const EXP_STATUSES: &[&str] = &["complete", "incomplete"];

pub const DEFAULT_BLOCK_SUBTYPE: &str = "wake";
pub const DEFAULT_EXP_STATUS: &str = "complete";

/// Experience status counted by completed-only views.
pub const EXP_STATUS_COMPLETE: &str = "complete";

/// Column names a caller may not declare as metrics.
pub const RESERVED_COLUMNS: &[&str] = &[TIMESTAMP, REGIME_NUM];

/// Check if a log format version is readable by this build.
///
/// Versions are compatible when their major components match.
pub fn is_compatible(version: &str) -> bool {
    let major = |v: &str| v.split('.').next().and_then(|s| s.parse::<u32>().ok());

    match (major(LOG_FORMAT_VERSION), major(version)) {
        (Some(current), Some(other)) => current == other,
        _ => false,
    }
}
