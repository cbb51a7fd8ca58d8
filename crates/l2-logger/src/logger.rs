//! Per-producer experience logger.
//!
//! # Write path
//!
//! ```text
//! log_record(record)
//!     │
//!     ├─ augment      → reject caller timestamp, inject timestamp + defaults
//!     ├─ schema       → required fields (first record) / frozen set (later)
//!     ├─ validators   → enums, worker id, task params, monotonic counters
//!     ├─ partition    → (worker_id, block_num, block_type); rotate sink on change
//!     └─ write        → one flushed TSV row
//! ```
//!
//! Every check runs before any state changes, so a rejected record leaves the
//! counters, the frozen schema and the files exactly as they were.
//!
//! A logger is owned by one producer and does no internal locking. Separate
//! loggers with distinct worker ids write disjoint partition subtrees.

use crate::metadata::MetadataWriter;
use crate::record::{FieldValue, Record};
use crate::schema::{RecordProfile, RecordSchema};
use crate::sink::PartitionedSink;
use crate::validate::FieldValidators;
use crate::{DATA_FILE_NAME, TIMESTAMP_FORMAT};
use chrono::{DateTime, Local};
use l2_common::id::{ScenarioDirName, WorkerId, DEFAULT_WORKER_ID};
use l2_common::schema::{
    BLOCK_SUBTYPE, BLOCK_TYPE, DEFAULT_BLOCK_SUBTYPE, DEFAULT_EXP_STATUS, EXP_STATUS,
    TIMESTAMP, WORKER_ID,
};
use l2_common::{Error, Result};
use l2_config::{LoggerInfo, ScenarioInfo};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Identifies the physical file a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub worker_id: WorkerId,
    pub block_num: u64,
    pub block_type: String,
}

impl PartitionKey {
    /// Directory of this partition: `<scenario_dir>/<worker_id>/<block_num>-<block_type>`.
    pub fn dir(&self, scenario_dir: &Path) -> PathBuf {
        scenario_dir
            .join(self.worker_id.as_str())
            .join(format!("{}-{}", self.block_num, self.block_type))
    }

    pub fn file(&self, scenario_dir: &Path) -> PathBuf {
        self.dir(scenario_dir).join(DATA_FILE_NAME)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-{}", self.worker_id, self.block_num, self.block_type)
    }
}

/// Write-path counters, mostly for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    /// Records accepted and written.
    pub records_written: u64,
    /// Partition sinks opened, counting reopenings of the same partition.
    pub sinks_opened: u64,
}

/// Keeps exactly one partition sink open, rotating when the key changes.
///
/// Rotation closes (flushes) the previous sink before the next one is bound,
/// so at most one file handle is held at a time.
#[derive(Debug)]
pub struct PartitionRouter {
    scenario_dir: PathBuf,
    active: Option<(PartitionKey, PartitionedSink)>,
    opened: u64,
}

impl PartitionRouter {
    pub fn new(scenario_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenario_dir: scenario_dir.into(),
            active: None,
            opened: 0,
        }
    }

    pub fn current(&self) -> Option<&PartitionKey> {
        self.active.as_ref().map(|(key, _)| key)
    }

    /// Sinks opened so far, counting reopenings of the same partition.
    pub fn opened(&self) -> u64 {
        self.opened
    }

    /// Sink for `key`; `fields` is only consulted when a new sink is bound.
    pub fn route(
        &mut self,
        key: PartitionKey,
        fields: impl FnOnce() -> Vec<String>,
    ) -> Result<&mut PartitionedSink> {
        let active = match self.active.take() {
            Some((current, sink)) if current == key => (current, sink),
            previous => {
                if let Some((previous, mut sink)) = previous {
                    sink.close()?;
                    debug!(partition = %previous, "rotated away from partition");
                }
                debug!(partition = %key, "switched to partition");
                self.opened += 1;
                let sink = PartitionedSink::new(key.file(&self.scenario_dir), fields());
                (key, sink)
            }
        };
        Ok(&mut self.active.insert(active).1)
    }

    /// Flush and close the open sink, if any. Safe to call repeatedly.
    pub fn close(&mut self) -> Result<()> {
        if let Some((key, mut sink)) = self.active.take() {
            sink.close()?;
            debug!(partition = %key, "closed partition");
        }
        Ok(())
    }
}

/// Experience logger for one producer.
pub struct DataLogger {
    logging_base_dir: PathBuf,
    scenario_dir: PathBuf,
    logger_info: LoggerInfo,
    scenario_info: ScenarioInfo,
    schema: RecordSchema,
    validators: FieldValidators,
    router: PartitionRouter,
    records_written: u64,
}

impl DataLogger {
    /// Create a scenario directory under `logging_base_dir` and write its
    /// metadata files, using the current record profile.
    pub fn new(
        logging_base_dir: impl Into<PathBuf>,
        scenario_name: &str,
        logger_info: LoggerInfo,
        scenario_info: Option<ScenarioInfo>,
    ) -> Result<Self> {
        Self::with_profile(
            logging_base_dir,
            scenario_name,
            logger_info,
            scenario_info,
            RecordProfile::default(),
        )
    }

    /// Like [`DataLogger::new`] with an explicit record profile.
    pub fn with_profile(
        logging_base_dir: impl Into<PathBuf>,
        scenario_name: &str,
        logger_info: LoggerInfo,
        scenario_info: Option<ScenarioInfo>,
        profile: RecordProfile,
    ) -> Result<Self> {
        if scenario_name.is_empty() {
            return Err(Error::InvalidConfiguration(
                "scenario name cannot be empty".to_string(),
            ));
        }
        let logging_base_dir = logging_base_dir.into();
        let scenario_dir = logging_base_dir.join(ScenarioDirName::new(scenario_name).0);
        Self::build(logging_base_dir, scenario_dir, logger_info, scenario_info, profile)
    }

    /// Attach a logger to an existing or explicit scenario directory.
    ///
    /// One logger per worker may share a scenario directory as long as their
    /// worker ids differ. Each rewrites the metadata files, so callers must
    /// pass identical metadata and serialize construction.
    pub fn in_scenario_dir(
        scenario_dir: impl Into<PathBuf>,
        logger_info: LoggerInfo,
        scenario_info: Option<ScenarioInfo>,
        profile: RecordProfile,
    ) -> Result<Self> {
        let scenario_dir = scenario_dir.into();
        let logging_base_dir = scenario_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::build(logging_base_dir, scenario_dir, logger_info, scenario_info, profile)
    }

    fn build(
        logging_base_dir: PathBuf,
        scenario_dir: PathBuf,
        logger_info: LoggerInfo,
        scenario_info: Option<ScenarioInfo>,
        profile: RecordProfile,
    ) -> Result<Self> {
        logger_info.validate()?;
        let scenario_info = scenario_info.unwrap_or_default();
        scenario_info.validate()?;
        let logger_info = logger_info.with_format_version(profile.format_version());

        MetadataWriter::new(&scenario_dir).write(&logger_info, &scenario_info)?;
        info!(
            scenario_dir = %scenario_dir.display(),
            metrics = ?logger_info.metrics_columns,
            "created logging scenario"
        );

        let schema = RecordSchema::new(profile, logger_info.metrics_columns.iter().cloned());
        Ok(Self {
            logging_base_dir,
            logger_info,
            scenario_info,
            schema,
            validators: FieldValidators::new(),
            router: PartitionRouter::new(&scenario_dir),
            scenario_dir,
            records_written: 0,
        })
    }

    pub fn logging_base_dir(&self) -> &Path {
        &self.logging_base_dir
    }

    pub fn scenario_dir(&self) -> &Path {
        &self.scenario_dir
    }

    pub fn logger_info(&self) -> &LoggerInfo {
        &self.logger_info
    }

    pub fn scenario_info(&self) -> &ScenarioInfo {
        &self.scenario_info
    }

    pub fn profile(&self) -> RecordProfile {
        self.schema.profile()
    }

    /// The frozen column order, once the first record has been written.
    pub fn fields(&self) -> Option<&[String]> {
        self.schema.fields()
    }

    /// Partition of the currently open sink, if any.
    pub fn current_partition(&self) -> Option<&PartitionKey> {
        self.router.current()
    }

    pub fn stats(&self) -> LoggerStats {
        LoggerStats {
            records_written: self.records_written,
            sinks_opened: self.router.opened(),
        }
    }

    /// Validate and append one experience record.
    pub fn log_record(&mut self, record: &Record) -> Result<()> {
        self.log_record_at(record, Local::now())
    }

    fn log_record_at(&mut self, record: &Record, now: DateTime<Local>) -> Result<()> {
        let record = self.augment(record, now)?;
        self.schema.check_fields(&record)?;
        let counters = self.validators.check(&record, self.schema.profile())?;
        let key = partition_key(&record, counters.block_num)?;
        let schema = &self.schema;
        self.router
            .route(key, || match schema.fields() {
                Some(fields) => fields.to_vec(),
                None => schema.order_for(&record),
            })?
            .write(&record)?;

        self.schema.bind(&record);
        self.validators.commit(counters);
        self.records_written += 1;
        Ok(())
    }

    /// Copy `record`, inject the timestamp and fill defaulted fields.
    fn augment(&self, record: &Record, now: DateTime<Local>) -> Result<Record> {
        if record.contains(TIMESTAMP) {
            return Err(Error::SchemaMismatch(
                "timestamp column cannot be overwritten".to_string(),
            ));
        }
        let mut record = record.clone();
        record.insert(TIMESTAMP, now.format(TIMESTAMP_FORMAT).to_string());
        if self.schema.profile().has_subtype() && !record.contains(BLOCK_SUBTYPE) {
            record.insert(BLOCK_SUBTYPE, DEFAULT_BLOCK_SUBTYPE);
        }
        if !record.contains(EXP_STATUS) {
            record.insert(EXP_STATUS, DEFAULT_EXP_STATUS);
        }
        if !record.contains(WORKER_ID) {
            record.insert(WORKER_ID, DEFAULT_WORKER_ID);
        }
        Ok(record)
    }

    /// Flush and close the open sink, if any. Safe to call repeatedly.
    pub fn close(&mut self) -> Result<()> {
        self.router.close()
    }
}

impl Drop for DataLogger {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl fmt::Debug for DataLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataLogger")
            .field("scenario_dir", &self.scenario_dir)
            .field("profile", &self.schema.profile())
            .field("partition", &self.current_partition())
            .field("stats", &self.stats())
            .finish()
    }
}

fn partition_key(record: &Record, block_num: u64) -> Result<PartitionKey> {
    let text = |field: &str| -> Result<String> {
        record
            .get(field)
            .and_then(FieldValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidFormat {
                field: field.to_string(),
                reason: "must be a string".to_string(),
            })
    };
    let worker_id = text(WORKER_ID)?;
    let worker_id = WorkerId::parse(&worker_id).ok_or_else(|| Error::InvalidFormat {
        field: WORKER_ID.to_string(),
        reason: format!("'{worker_id}' is not a valid worker id"),
    })?;
    Ok(PartitionKey {
        worker_id,
        block_num,
        block_type: text(BLOCK_TYPE)?,
    })
}
