//! Whole-dataset validation.
//!
//! Applies the record invariants the writer enforces one record at a time,
//! but over full columns of a merged dataset. Counter monotonicity is
//! checked per `worker_id`: each logger instance owns its own counters, so
//! rows of different workers may interleave freely in the merged order.

use crate::dataset::{int_cell, Dataset};
use l2_common::id::is_valid_worker_id;
use l2_common::schema::{
    BLOCK_NUM, BLOCK_SUBTYPE, BLOCK_SUBTYPES, BLOCK_TYPE, BLOCK_TYPES, EXP_NUM, EXP_STATUS,
    EXP_STATUSES, STANDARD_FIELDS, TASK_PARAMS, WORKER_ID,
};
use l2_common::{Error, Result};
use l2_config::LoggerInfo;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One failed check, attributed to a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnViolation {
    pub column: String,
    pub message: String,
}

impl fmt::Display for ColumnViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.column, self.message)
    }
}

/// Outcome of validating one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<ColumnViolation>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Fold the report into an error if anything failed.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            return Ok(());
        }
        let summary = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::BatchValidation {
            count: self.violations.len(),
            summary,
        })
    }

    fn push(&mut self, column: &str, message: impl Into<String>) {
        self.violations.push(ColumnViolation {
            column: column.to_string(),
            message: message.into(),
        });
    }
}

/// Re-checks record invariants over a merged dataset.
#[derive(Debug, Clone, Default)]
pub struct BatchValidator {
    metric_columns: Vec<String>,
}

impl BatchValidator {
    pub fn new<I, S>(metric_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metric_columns: metric_columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_logger_info(info: &LoggerInfo) -> Self {
        Self::new(info.metrics_columns.iter().cloned())
    }

    /// Run every check and collect all failures.
    ///
    /// A missing column is reported once and its content checks are skipped.
    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let mut report = ValidationReport::default();

        let required = STANDARD_FIELDS
            .iter()
            .copied()
            .chain(self.metric_columns.iter().map(String::as_str));
        for column in required {
            if !dataset.has_column(column) {
                report.push(column, "required column is missing");
            }
        }

        check_counter(dataset, BLOCK_NUM, &mut report);
        check_counter(dataset, EXP_NUM, &mut report);
        check_enum(dataset, BLOCK_TYPE, BLOCK_TYPES, &mut report);
        check_enum(dataset, BLOCK_SUBTYPE, BLOCK_SUBTYPES, &mut report);
        check_enum(dataset, EXP_STATUS, EXP_STATUSES, &mut report);
        check_worker_ids(dataset, &mut report);
        check_task_params(dataset, &mut report);
        report
    }

    /// Validate and fail on the first report with violations.
    pub fn check(&self, dataset: &Dataset) -> Result<()> {
        self.validate(dataset).into_result()
    }
}

fn check_counter(dataset: &Dataset, column: &str, report: &mut ValidationReport) {
    let Some(values) = dataset.column(column) else {
        return;
    };
    let parsed: Vec<Option<u64>> = values
        .iter()
        .map(|v| int_cell(v).and_then(|n| u64::try_from(n).ok()))
        .collect();
    let bad = parsed.iter().filter(|n| n.is_none()).count();
    if bad > 0 {
        report.push(
            column,
            format!("{bad} value(s) are negative or not integers"),
        );
        return;
    }

    let workers = dataset.column(WORKER_ID);
    let mut last: BTreeMap<&str, u64> = BTreeMap::new();
    let mut decreasing: BTreeMap<&str, usize> = BTreeMap::new();
    for (row, n) in parsed.into_iter().flatten().enumerate() {
        let worker = workers.as_ref().map_or("", |w| w[row]);
        if let Some(&prev) = last.get(worker) {
            if n < prev {
                *decreasing.entry(worker).or_default() += 1;
            }
        }
        last.insert(worker, n);
    }
    if !decreasing.is_empty() {
        let detail = decreasing
            .iter()
            .map(|(w, n)| format!("{w} ({n})"))
            .collect::<Vec<_>>()
            .join(", ");
        report.push(column, format!("must be non-decreasing per worker: {detail}"));
    }
}

fn check_enum(
    dataset: &Dataset,
    column: &str,
    allowed: &[&str],
    report: &mut ValidationReport,
) {
    let Some(values) = dataset.column(column) else {
        return;
    };
    let mut invalid: Vec<&str> = values
        .into_iter()
        .filter(|v| !allowed.contains(v))
        .collect();
    if invalid.is_empty() {
        return;
    }
    invalid.sort_unstable();
    invalid.dedup();
    report.push(
        column,
        format!("invalid values {invalid:?}, allowed {allowed:?}"),
    );
}

fn check_worker_ids(dataset: &Dataset, report: &mut ValidationReport) {
    let Some(values) = dataset.column(WORKER_ID) else {
        return;
    };
    let bad = values.iter().filter(|v| !is_valid_worker_id(v)).count();
    if bad > 0 {
        report.push(
            WORKER_ID,
            format!(
                "{bad} value(s) contain characters other than alphanumerics, underscores, hyphens, or periods"
            ),
        );
    }
}

fn check_task_params(dataset: &Dataset, report: &mut ValidationReport) {
    let Some(values) = dataset.column(TASK_PARAMS) else {
        return;
    };
    let bad = values
        .iter()
        .filter(|v| !v.is_empty())
        .filter(|v| serde_json::from_str::<serde_json::Value>(v).is_err())
        .count();
    if bad > 0 {
        report.push(TASK_PARAMS, format!("{bad} value(s) are not valid JSON"));
    }
}
