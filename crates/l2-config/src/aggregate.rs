//! Options for reconstructing structure from an aggregated log.

use serde::{Deserialize, Serialize};

/// Columns whose change between consecutive rows starts a new regime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeKey {
    /// `block_num, block_type, block_subtype, task_name, task_params`.
    #[default]
    WithTaskParams,
    /// `block_num, block_type, block_subtype, task_name`; a parameter change
    /// within the same task does not split the regime.
    WithoutTaskParams,
}

impl RegimeKey {
    pub fn includes_task_params(self) -> bool {
        matches!(self, RegimeKey::WithTaskParams)
    }
}

/// Aggregation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    #[serde(default)]
    pub regime_key: RegimeKey,
}

impl AggregateConfig {
    pub fn with_regime_key(mut self, regime_key: RegimeKey) -> Self {
        self.regime_key = regime_key;
        self
    }
}
