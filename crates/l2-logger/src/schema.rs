//! Record profiles and the frozen field schema.
//!
//! The first record a logger accepts fixes the ordered column list: the
//! profile's standard fields in their fixed order, followed by every other
//! field name sorted lexicographically. Later records must carry exactly the
//! same field set.

use crate::record::Record;
use l2_common::schema::{
    BLOCK_NUM, BLOCK_TYPE, EXP_NUM, EXP_STATUS, LEGACY_LOG_FORMAT_VERSION, LOG_FORMAT_VERSION,
    RESERVED_COLUMNS, STANDARD_FIELDS, TASK_NAME, TASK_PARAMS, TIMESTAMP, WORKER_ID,
};
use l2_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const CURRENT_FIELDS: &[&str] = STANDARD_FIELDS;

const NO_SUBTYPE_FIELDS: &[&str] = &[
    BLOCK_NUM,
    EXP_NUM,
    WORKER_ID,
    BLOCK_TYPE,
    TASK_NAME,
    TASK_PARAMS,
    EXP_STATUS,
    TIMESTAMP,
];

/// Selects the standard field list a logger enforces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordProfile {
    /// Format 1.1: wake/sleep subtypes are recorded.
    #[default]
    Current,
    /// Format 1.0: no `block_subtype` column.
    NoSubtype,
}

impl RecordProfile {
    /// Standard fields in column order.
    pub fn standard_fields(self) -> &'static [&'static str] {
        match self {
            RecordProfile::Current => CURRENT_FIELDS,
            RecordProfile::NoSubtype => NO_SUBTYPE_FIELDS,
        }
    }

    pub fn has_subtype(self) -> bool {
        matches!(self, RecordProfile::Current)
    }

    /// Version stamped into `logger_info.json`.
    pub fn format_version(self) -> &'static str {
        match self {
            RecordProfile::Current => LOG_FORMAT_VERSION,
            RecordProfile::NoSubtype => LEGACY_LOG_FORMAT_VERSION,
        }
    }
}

/// Field schema of one logger, frozen by its first record.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    profile: RecordProfile,
    metric_fields: BTreeSet<String>,
    frozen: Option<Vec<String>>,
}

impl RecordSchema {
    pub fn new<I, S>(profile: RecordProfile, metric_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            profile,
            metric_fields: metric_fields.into_iter().map(Into::into).collect(),
            frozen: None,
        }
    }

    pub fn profile(&self) -> RecordProfile {
        self.profile
    }

    pub fn is_bound(&self) -> bool {
        self.frozen.is_some()
    }

    /// The frozen column order, once bound.
    pub fn fields(&self) -> Option<&[String]> {
        self.frozen.as_deref()
    }

    /// Column order `record` would freeze: standard fields, then the rest sorted.
    pub fn order_for(&self, record: &Record) -> Vec<String> {
        let standard = self.profile.standard_fields();
        let mut fields: Vec<String> = standard.iter().map(|f| f.to_string()).collect();
        // Record keys iterate in sorted order already.
        fields.extend(
            record
                .keys()
                .filter(|k| !standard.contains(k))
                .map(str::to_string),
        );
        fields
    }

    /// Freeze the column order from `record` if not yet bound.
    pub fn bind(&mut self, record: &Record) -> &[String] {
        if self.frozen.is_none() {
            self.frozen = Some(self.order_for(record));
        }
        self.frozen.as_deref().unwrap_or_default()
    }

    /// Check a record's field set against the schema.
    ///
    /// Derived columns such as `regime_num` are never accepted. Before
    /// binding, the record must carry at least every standard and metric
    /// field. After binding, its field set must equal the frozen set.
    pub fn check_fields(&self, record: &Record) -> Result<()> {
        let reserved = record
            .keys()
            .find(|k| *k != TIMESTAMP && RESERVED_COLUMNS.contains(k));
        if let Some(reserved) = reserved {
            return Err(Error::SchemaMismatch(format!(
                "field '{reserved}' is reserved and cannot be logged"
            )));
        }
        let record_set: BTreeSet<&str> = record.keys().collect();
        match &self.frozen {
            None => {
                let standard: BTreeSet<&str> =
                    self.profile.standard_fields().iter().copied().collect();
                let missing: Vec<&str> = standard.difference(&record_set).copied().collect();
                if !missing.is_empty() {
                    return Err(Error::SchemaMismatch(format!(
                        "standard record fields missing: {missing:?}"
                    )));
                }
                let missing: Vec<&str> = self
                    .metric_fields
                    .iter()
                    .map(String::as_str)
                    .filter(|m| !record_set.contains(m))
                    .collect();
                if !missing.is_empty() {
                    return Err(Error::SchemaMismatch(format!(
                        "metric record fields missing: {missing:?}"
                    )));
                }
                Ok(())
            }
            Some(frozen) => {
                let frozen_set: BTreeSet<&str> = frozen.iter().map(String::as_str).collect();
                if frozen_set == record_set {
                    return Ok(());
                }
                let missing: Vec<&str> = frozen_set.difference(&record_set).copied().collect();
                let extra: Vec<&str> = record_set.difference(&frozen_set).copied().collect();
                Err(Error::SchemaMismatch(format!(
                    "record field mismatch: missing {missing:?}, unexpected {extra:?}"
                )))
            }
        }
    }
}
