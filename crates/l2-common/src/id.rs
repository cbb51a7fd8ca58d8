//! Worker and scenario identity types.
//!
//! A worker id names one producer and becomes a directory component of
//! every partition it writes, so it is restricted to `[0-9A-Za-z_.-]+`.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Worker id assigned to records that do not name one.
pub const DEFAULT_WORKER_ID: &str = "worker-default";

static WORKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_.\-]+$").expect("regex"));

/// Whether `s` fully matches the worker identifier pattern.
pub fn is_valid_worker_id(s: &str) -> bool {
    WORKER_RE.is_match(s)
}

/// Validated worker identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Parse and validate a worker id string.
    pub fn parse(s: &str) -> Option<Self> {
        is_valid_worker_id(s).then(|| WorkerId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        WorkerId(DEFAULT_WORKER_ID.to_string())
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directory name of one logging session.
///
/// Format: `<scenario stem>-<unix seconds>-<microseconds>`
/// Example: `my_scenario-1700000000-042137`
///
/// The stem is the final path component of the scenario name up to its first
/// `.`, so `configs/foo.json` yields `foo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioDirName(pub String);

impl ScenarioDirName {
    /// Derive the directory name for a session started now.
    pub fn new(scenario_name: &str) -> Self {
        Self::at(scenario_name, Utc::now())
    }

    /// Derive the directory name for a session started at `started`.
    pub fn at(scenario_name: &str, started: DateTime<Utc>) -> Self {
        let base = Path::new(scenario_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(scenario_name);
        let stem = base.split('.').next().unwrap_or(base);
        ScenarioDirName(format!(
            "{}-{}-{:06}",
            stem,
            started.timestamp(),
            started.timestamp_subsec_micros()
        ))
    }
}

impl fmt::Display for ScenarioDirName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_worker_id_pattern() {
        assert!(is_valid_worker_id("worker0"));
        assert!(is_valid_worker_id("worker-default"));
        assert!(is_valid_worker_id("node_3.gpu-1"));
        assert!(!is_valid_worker_id(""));
        assert!(!is_valid_worker_id("a+b"));
        assert!(!is_valid_worker_id("a/b"));
        assert!(!is_valid_worker_id("worker 0"));
        assert!(!is_valid_worker_id("worker0\n"));
    }

    #[test]
    fn test_worker_id_default() {
        assert_eq!(WorkerId::default().as_str(), DEFAULT_WORKER_ID);
        assert!(WorkerId::parse(DEFAULT_WORKER_ID).is_some());
        assert!(WorkerId::parse("bad id").is_none());
    }

    #[test]
    fn test_scenario_dir_name_format() {
        let started = Utc.timestamp_opt(1_700_000_000, 42_137_000).unwrap();
        let name = ScenarioDirName::at("configs/my_scenario.json", started);
        assert_eq!(name.0, "my_scenario-1700000000-042137");
    }

    #[test]
    fn test_scenario_dir_name_plain() {
        let started = Utc.timestamp_opt(10, 0).unwrap();
        assert_eq!(ScenarioDirName::at("test", started).0, "test-10-000000");
    }
}
