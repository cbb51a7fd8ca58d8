//! Regime reconstruction.
//!
//! A regime is a maximal run of consecutive rows that agree on the key
//! columns. Numbers start at 0 on the first row and grow by one at every
//! change, so they are strictly increasing in order of first appearance.

use crate::dataset::Dataset;
use l2_common::schema::{BLOCK_NUM, BLOCK_SUBTYPE, BLOCK_TYPE, REGIME_NUM, TASK_NAME, TASK_PARAMS};
use l2_common::{Error, Result};
use l2_config::RegimeKey;

const KEY_WITH_PARAMS: &[&str] = &[BLOCK_NUM, BLOCK_TYPE, BLOCK_SUBTYPE, TASK_NAME, TASK_PARAMS];
const KEY_WITHOUT_PARAMS: &[&str] = &[BLOCK_NUM, BLOCK_TYPE, BLOCK_SUBTYPE, TASK_NAME];

/// Columns compared between consecutive rows.
pub fn key_columns(key: RegimeKey) -> &'static [&'static str] {
    if key.includes_task_params() {
        KEY_WITH_PARAMS
    } else {
        KEY_WITHOUT_PARAMS
    }
}

/// Regime number of every row, in row order.
///
/// The dataset must already be in its final order. An empty dataset has no
/// regimes and needs no key columns.
pub fn regime_numbers(dataset: &Dataset, key: RegimeKey) -> Result<Vec<u64>> {
    if dataset.is_empty() {
        return Ok(Vec::new());
    }
    let indices = key_columns(key)
        .iter()
        .map(|&c| {
            dataset.column_index(c).ok_or_else(|| {
                Error::SchemaMismatch(format!("dataset is missing regime key column '{c}'"))
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut numbers = Vec::with_capacity(dataset.len());
    let mut regime = 0u64;
    let mut previous: Option<&Vec<String>> = None;
    for row in dataset.rows() {
        if let Some(prev) = previous {
            if indices.iter().any(|&i| prev[i] != row[i]) {
                regime += 1;
            }
        }
        numbers.push(regime);
        previous = Some(row);
    }
    Ok(numbers)
}

/// Compute regime numbers and store them in the `regime_num` column.
pub fn fill_regime_num(dataset: &mut Dataset, key: RegimeKey) -> Result<()> {
    let numbers = regime_numbers(dataset, key)?;
    dataset.set_column(REGIME_NUM, numbers.iter().map(u64::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: &[(&str, &str, &str, &str)]) -> Dataset {
        let mut ds = Dataset::new([BLOCK_NUM, BLOCK_TYPE, BLOCK_SUBTYPE, TASK_NAME, TASK_PARAMS]);
        for &(block, block_type, task, params) in rows {
            ds.push_row(vec![
                block.into(),
                block_type.into(),
                "wake".into(),
                task.into(),
                params.into(),
            ])
            .unwrap();
        }
        ds
    }

    #[test]
    fn test_regimes_follow_key_changes() {
        let ds = dataset(&[
            ("0", "train", "a", "{}"),
            ("0", "train", "a", "{}"),
            ("0", "train", "b", "{}"),
            ("1", "test", "b", "{}"),
        ]);
        assert_eq!(regime_numbers(&ds, RegimeKey::default()).unwrap(), [0, 0, 1, 2]);
    }

    #[test]
    fn test_task_params_key_flag() {
        let ds = dataset(&[
            ("0", "train", "a", r#"{"p":1}"#),
            ("0", "train", "a", r#"{"p":2}"#),
            ("0", "train", "a", r#"{"p":2}"#),
        ]);
        assert_eq!(
            regime_numbers(&ds, RegimeKey::WithTaskParams).unwrap(),
            [0, 1, 1]
        );
        assert_eq!(
            regime_numbers(&ds, RegimeKey::WithoutTaskParams).unwrap(),
            [0, 0, 0]
        );
    }

    #[test]
    fn test_returning_task_starts_new_regime() {
        let ds = dataset(&[
            ("0", "train", "a", "{}"),
            ("0", "train", "b", "{}"),
            ("0", "train", "a", "{}"),
        ]);
        assert_eq!(regime_numbers(&ds, RegimeKey::default()).unwrap(), [0, 1, 2]);
    }

    #[test]
    fn test_empty_dataset() {
        assert!(regime_numbers(&Dataset::default(), RegimeKey::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_missing_key_column() {
        let mut ds = Dataset::new([BLOCK_NUM]);
        ds.push_row(vec!["0".into()]).unwrap();
        assert!(matches!(
            regime_numbers(&ds, RegimeKey::default()),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_fill_regime_num() {
        let mut ds = dataset(&[("0", "train", "a", "{}"), ("1", "train", "a", "{}")]);
        fill_regime_num(&mut ds, RegimeKey::default()).unwrap();
        assert_eq!(ds.column(REGIME_NUM).unwrap(), ["0", "1"]);
    }
}
