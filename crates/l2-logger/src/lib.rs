//! Structured experience logging.
//!
//! This crate provides:
//! - `Record`: one experience as an ordered field → value mapping
//! - Record profiles and schema freezing on the first record
//! - Per-field validators with per-producer monotonic counters
//! - `PartitionedSink`: append-only tab-delimited files with a single header
//! - `DataLogger`: the per-producer façade routing records by
//!   `(worker_id, block_num, block_type)`
//!
//! # Layout
//!
//! ```text
//! <base>/<scenario>-<secs>-<micros>/
//! ├── logger_info.json
//! ├── scenario_info.json
//! └── <worker_id>/<block_num>-<block_type>/data-log.tsv
//! ```

pub mod logger;
pub mod metadata;
pub mod record;
pub mod schema;
pub mod sink;
pub mod validate;

pub use logger::{DataLogger, LoggerStats, PartitionKey, PartitionRouter};
pub use metadata::MetadataWriter;
pub use record::{FieldValue, Record};
pub use schema::{RecordProfile, RecordSchema};
pub use sink::PartitionedSink;
pub use validate::FieldValidators;

/// File name of every partition data file.
pub const DATA_FILE_NAME: &str = "data-log.tsv";

/// `strftime` format of the injected `timestamp` field.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6f";
