//! Read path of the l2 experience logger.
//!
//! A scenario written by `l2-logger` is a tree of partition files. This
//! crate merges them back into one ordered [`Dataset`], restores the
//! `regime_num` column, re-checks the record invariants over whole columns,
//! and reduces the result to one summary row per regime.
//!
//! ```text
//! scenario_dir ──read_log_data──► Dataset ──BatchValidator──► ValidationReport
//!                                   │
//!                                   └──summarize──► Vec<BlockSummary>
//! ```

pub mod dataset;
pub mod export;
pub mod read;
pub mod regime;
pub mod summary;
pub mod validate;

pub use dataset::Dataset;
pub use export::write_delimited;
pub use read::{read_log_data, read_log_data_with, read_logger_info, read_scenario_info};
pub use regime::{fill_regime_num, regime_numbers};
pub use summary::{summarize, BlockSummary, Summary, SUMMARY_COLUMNS};
pub use validate::{BatchValidator, ColumnViolation, ValidationReport};

/// File name of every partition data file.
pub const DATA_FILE_NAME: &str = "data-log.tsv";
