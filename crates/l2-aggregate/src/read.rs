//! Scenario readers.
//!
//! Reading never writes to the scenario tree. A scenario still being
//! written may be read; the result is whatever rows were flushed so far.

use crate::dataset::Dataset;
use crate::regime::fill_regime_num;
use crate::DATA_FILE_NAME;
use csv::ReaderBuilder;
use l2_common::schema::{is_compatible, BLOCK_SUBTYPE, DEFAULT_BLOCK_SUBTYPE, TASK_NAME};
use l2_common::{Error, Result};
use l2_config::{AggregateConfig, LoggerInfo, ScenarioInfo, LOGGER_INFO_FILE, SCENARIO_INFO_FILE};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Merge every partition file under `dir` with default options.
pub fn read_log_data(dir: impl AsRef<Path>) -> Result<Dataset> {
    read_log_data_with(dir, AggregateConfig::default())
}

/// Merge every partition file under `dir` into one dataset.
///
/// The result is sorted by `(exp_num, block_num)`, has lower-cased task
/// names, carries a `block_subtype` column even for logs that predate it,
/// and has a `regime_num` column computed over all rows. Callers that
/// filter rows afterwards should recompute regimes with
/// [`fill_regime_num`].
pub fn read_log_data_with(dir: impl AsRef<Path>, config: AggregateConfig) -> Result<Dataset> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::not_found(dir));
    }

    let mut merged = Dataset::default();
    let files = partition_files(dir)?;
    for path in &files {
        let part = read_partition(path)?;
        debug!(path = %path.display(), rows = part.len(), "read partition file");
        merged.append(part);
    }

    merged.map_column(TASK_NAME, str::to_lowercase);
    merged.ensure_column(BLOCK_SUBTYPE, DEFAULT_BLOCK_SUBTYPE);
    merged.sort_by_exp_block();
    fill_regime_num(&mut merged, config.regime_key)?;

    debug!(
        dir = %dir.display(),
        files = files.len(),
        rows = merged.len(),
        "aggregated scenario"
    );
    Ok(merged)
}

/// Partition files under `dir`, in file-name order.
fn partition_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && entry.file_name() == DATA_FILE_NAME {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_partition(path: &Path) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quote(b'"')
        .has_headers(true)
        .from_path(path)?;
    let mut part = Dataset::new(reader.headers()?.iter());
    for row in reader.records() {
        part.push_row(row?.iter().map(str::to_string).collect())?;
    }
    Ok(part)
}

fn read_json(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(Error::not_found(path));
    }
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Read and validate `logger_info.json` from a scenario directory.
pub fn read_logger_info(dir: impl AsRef<Path>) -> Result<LoggerInfo> {
    let info = LoggerInfo::from_value(&read_json(&dir.as_ref().join(LOGGER_INFO_FILE))?)?;
    if !is_compatible(&info.log_format_version) {
        return Err(Error::InvalidConfiguration(format!(
            "unsupported log format version '{}'",
            info.log_format_version
        )));
    }
    Ok(info)
}

/// Read and validate `scenario_info.json` from a scenario directory.
pub fn read_scenario_info(dir: impl AsRef<Path>) -> Result<ScenarioInfo> {
    ScenarioInfo::from_value(read_json(&dir.as_ref().join(SCENARIO_INFO_FILE))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use l2_common::schema::REGIME_NUM;
    use tempfile::tempdir;

    const HEADER: &str =
        "block_num\texp_num\tworker_id\tblock_type\tblock_subtype\ttask_name\ttask_params\texp_status\ttimestamp\treward";

    fn write_partition(root: &Path, rel: &str, rows: &[&str]) {
        let path = root.join(rel).join(DATA_FILE_NAME);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut text = format!("{HEADER}\n");
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_missing_dir_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read_log_data(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_merges_sorts_and_fills_regimes() {
        let dir = tempdir().unwrap();
        write_partition(
            dir.path(),
            "w1/0-train",
            &[
                "0\t1\tw1\ttrain\twake\tTaskA\t\"{\"\"p\"\": 1}\"\tcomplete\tt1\t0.5",
                "0\t3\tw1\ttrain\twake\ttaska\t\"{\"\"p\"\": 1}\"\tcomplete\tt3\t0.7",
            ],
        );
        write_partition(
            dir.path(),
            "w0/0-train",
            &["0\t2\tw0\ttrain\twake\ttaskB\t{}\tincomplete\tt2\t0.6"],
        );

        let ds = read_log_data(dir.path()).unwrap();
        assert_eq!(ds.column("exp_num").unwrap(), ["1", "2", "3"]);
        assert_eq!(ds.column("task_name").unwrap(), ["taska", "taskb", "taska"]);
        assert_eq!(ds.cell(0, "task_params"), Some(r#"{"p": 1}"#));
        assert_eq!(ds.column(REGIME_NUM).unwrap(), ["0", "1", "2"]);
    }

    #[test]
    fn test_legacy_logs_get_default_subtype() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w0/0-test").join(DATA_FILE_NAME);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "block_num\texp_num\tworker_id\tblock_type\ttask_name\ttask_params\texp_status\ttimestamp\treward\n\
             0\t0\tw0\ttest\ta\t{}\tcomplete\tt0\t1\n",
        )
        .unwrap();

        let ds = read_log_data(dir.path()).unwrap();
        assert_eq!(ds.column(BLOCK_SUBTYPE).unwrap(), ["wake"]);
    }

    #[test]
    fn test_empty_scenario() {
        let dir = tempdir().unwrap();
        let ds = read_log_data(dir.path()).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_metadata_readers() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_logger_info(dir.path()),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            read_scenario_info(dir.path()),
            Err(Error::NotFound { .. })
        ));

        fs::write(
            dir.path().join(LOGGER_INFO_FILE),
            r#"{"metrics_columns": ["reward"], "log_format_version": "1.1"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(SCENARIO_INFO_FILE),
            r#"{"author": "mock", "complexity": "1-low"}"#,
        )
        .unwrap();
        assert_eq!(read_logger_info(dir.path()).unwrap().metrics_columns, ["reward"]);
        assert_eq!(
            read_scenario_info(dir.path()).unwrap().get("author"),
            Some(&Value::from("mock"))
        );
    }

    #[test]
    fn test_incompatible_version_rejected() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(LOGGER_INFO_FILE),
            r#"{"metrics_columns": ["reward"], "log_format_version": "2.0"}"#,
        )
        .unwrap();
        assert!(matches!(
            read_logger_info(dir.path()),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_legacy_metadata_without_version() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(LOGGER_INFO_FILE),
            r#"{"metrics_columns": ["reward"]}"#,
        )
        .unwrap();
        assert_eq!(read_logger_info(dir.path()).unwrap().log_format_version, "1.0");
    }
}
