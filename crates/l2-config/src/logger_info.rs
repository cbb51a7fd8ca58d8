//! Logger metadata: declared metric columns and log format version.
//!
//! Written once to `logger_info.json` when a logger is constructed and read
//! back by the aggregator to learn which metric columns to require.

use l2_common::schema::{LEGACY_LOG_FORMAT_VERSION, LOG_FORMAT_VERSION, RESERVED_COLUMNS};
use l2_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const METRICS_KEY: &str = "metrics_columns";
const VERSION_KEY: &str = "log_format_version";

fn default_version() -> String {
    LEGACY_LOG_FORMAT_VERSION.to_string()
}

/// Contents of `logger_info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerInfo {
    /// Caller-declared metric columns; every record must carry each of them.
    pub metrics_columns: Vec<String>,

    /// Format version of the data files this logger writes.
    #[serde(default = "default_version")]
    pub log_format_version: String,

    /// Additional caller keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoggerInfo {
    /// Build logger metadata for the current format version.
    pub fn new<I, S>(metrics_columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let info = LoggerInfo {
            metrics_columns: metrics_columns.into_iter().map(Into::into).collect(),
            log_format_version: LOG_FORMAT_VERSION.to_string(),
            extra: Map::new(),
        };
        info.validate()?;
        Ok(info)
    }

    /// Parse untyped logger metadata, checking its shape before its content.
    ///
    /// A missing `log_format_version` is read as the legacy version.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            Error::InvalidConfiguration("logger_info must be a JSON object".to_string())
        })?;
        let cols = obj.get(METRICS_KEY).ok_or_else(|| {
            Error::InvalidConfiguration(format!("logger_info missing required key '{METRICS_KEY}'"))
        })?;
        let list = cols.as_array().ok_or_else(|| {
            Error::InvalidConfiguration(format!("logger_info['{METRICS_KEY}'] must be a list of strings"))
        })?;
        let metrics_columns = list
            .iter()
            .map(|c| c.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "logger_info['{METRICS_KEY}'] must be a list of strings"
                ))
            })?;
        let log_format_version = match obj.get(VERSION_KEY) {
            None => default_version(),
            Some(Value::String(v)) => v.clone(),
            Some(other) => {
                return Err(Error::InvalidConfiguration(format!(
                    "logger_info['{VERSION_KEY}'] must be a string, got {other}"
                )))
            }
        };
        let extra = obj
            .iter()
            .filter(|(k, _)| k.as_str() != METRICS_KEY && k.as_str() != VERSION_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let info = LoggerInfo {
            metrics_columns,
            log_format_version,
            extra,
        };
        info.validate()?;
        Ok(info)
    }

    /// Semantic checks on the declared metric columns.
    pub fn validate(&self) -> Result<()> {
        if self.metrics_columns.is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "logger_info['{METRICS_KEY}'] cannot be empty"
            )));
        }
        for col in &self.metrics_columns {
            if col.is_empty() {
                return Err(Error::InvalidConfiguration(
                    "metric column names cannot be empty".to_string(),
                ));
            }
            if RESERVED_COLUMNS.contains(&col.as_str()) {
                return Err(Error::InvalidConfiguration(format!(
                    "metric column '{col}' is reserved"
                )));
            }
            if self.extra.contains_key(col) {
                return Err(Error::InvalidConfiguration(format!(
                    "metric column '{col}' collides with a logger_info key"
                )));
            }
        }
        Ok(())
    }

    /// Return a copy stamped with `version`.
    pub fn with_format_version(mut self, version: &str) -> Self {
        self.log_format_version = version.to_string();
        self
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
