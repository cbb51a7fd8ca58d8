//! One representative row per regime.

use crate::dataset::{int_cell, Dataset};
use l2_common::schema::{BLOCK_NUM, BLOCK_SUBTYPE, BLOCK_TYPE, REGIME_NUM, TASK_NAME, TASK_PARAMS};
use l2_common::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Columns of a summary row, in output order.
pub const SUMMARY_COLUMNS: &[&str] = &[
    REGIME_NUM,
    BLOCK_NUM,
    BLOCK_TYPE,
    BLOCK_SUBTYPE,
    TASK_NAME,
    TASK_PARAMS,
];

/// The first row of one regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub regime_num: u64,
    pub block_num: String,
    pub block_type: String,
    pub block_subtype: String,
    pub task_name: String,
    pub task_params: String,
}

/// Per-regime summary of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Ordered by `regime_num`.
    pub blocks: Vec<BlockSummary>,
    /// False when the distinct regime count differs from the highest
    /// regime number plus one.
    pub consistent: bool,
}

impl Summary {
    /// Summary rows as a table with [`SUMMARY_COLUMNS`].
    pub fn to_dataset(&self) -> Result<Dataset> {
        let mut ds = Dataset::new(SUMMARY_COLUMNS.iter().copied());
        for b in &self.blocks {
            ds.push_row(vec![
                b.regime_num.to_string(),
                b.block_num.clone(),
                b.block_type.clone(),
                b.block_subtype.clone(),
                b.task_name.clone(),
                b.task_params.clone(),
            ])?;
        }
        Ok(ds)
    }
}

/// Reduce a regime-annotated dataset to one row per regime.
///
/// Each regime is represented by its first row. A gap in the regime
/// numbering is logged as a warning, not returned as an error: it points at
/// a producer reusing task parameters across blocks, not at corrupt data.
pub fn summarize(dataset: &Dataset) -> Result<Summary> {
    let regimes = dataset.column(REGIME_NUM).ok_or_else(|| {
        Error::SchemaMismatch(format!("dataset has no '{REGIME_NUM}' column"))
    })?;
    let cell = |row: usize, column: &str| dataset.cell(row, column).unwrap_or_default().to_string();

    let mut blocks: BTreeMap<u64, BlockSummary> = BTreeMap::new();
    for (row, value) in regimes.iter().enumerate() {
        let regime_num = int_cell(value)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| Error::InvalidFormat {
                field: REGIME_NUM.to_string(),
                reason: format!("must be a non-negative integer, got '{value}'"),
            })?;
        blocks.entry(regime_num).or_insert_with(|| BlockSummary {
            regime_num,
            block_num: cell(row, BLOCK_NUM),
            block_type: cell(row, BLOCK_TYPE),
            block_subtype: cell(row, BLOCK_SUBTYPE),
            task_name: cell(row, TASK_NAME),
            task_params: cell(row, TASK_PARAMS),
        });
    }

    let expected = blocks.keys().next_back().map_or(0, |max| max + 1);
    let consistent = blocks.len() as u64 == expected;
    if !consistent {
        warn!(
            regimes = blocks.len(),
            expected,
            "regime count does not match highest regime number; check for reused task parameters"
        );
    }
    Ok(Summary {
        blocks: blocks.into_values().collect(),
        consistent,
    })
}
