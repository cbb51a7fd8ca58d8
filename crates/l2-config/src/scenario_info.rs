//! Free-form scenario metadata.
//!
//! Callers may attach any JSON object to a scenario. Three descriptive keys
//! are drawn from closed label sets and checked when present.

use l2_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Allowed `complexity` labels.
pub const COMPLEXITIES: &[&str] = &["1-low", "2-intermediate", "3-high"];

/// Allowed `difficulty` labels.
pub const DIFFICULTIES: &[&str] = &["1-easy", "2-medium", "3-hard"];

/// Allowed `scenario_type` labels.
pub const SCENARIO_TYPES: &[&str] = &["custom", "alternating", "permuted"];

const LABELLED_KEYS: &[(&str, &[&str])] = &[
    ("complexity", COMPLEXITIES),
    ("difficulty", DIFFICULTIES),
    ("scenario_type", SCENARIO_TYPES),
];

/// Contents of `scenario_info.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioInfo(pub Map<String, Value>);

impl ScenarioInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate untyped scenario metadata.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let info = ScenarioInfo(map);
                info.validate()?;
                Ok(info)
            }
            Value::Null => Ok(Self::default()),
            other => Err(Error::InvalidConfiguration(format!(
                "scenario_info must be a JSON object, got {other}"
            ))),
        }
    }

    /// Builder-style insertion of one metadata key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Check the closed-set labels that are present.
    pub fn validate(&self) -> Result<()> {
        for &(key, allowed) in LABELLED_KEYS {
            let Some(value) = self.0.get(key) else {
                continue;
            };
            let label = value.as_str().unwrap_or_default();
            if !allowed.contains(&label) {
                return Err(Error::InvalidEnum {
                    field: key.to_string(),
                    value: value.to_string(),
                    allowed,
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}
