//! Append-only tab-delimited partition files.
//!
//! A sink is lazy: nothing touches the filesystem until the first write.
//! The header row is written only when the file is new or empty, so
//! reopening a populated partition appends rows under its existing header.
//! Every row is flushed immediately so partial sessions stay inspectable.

use crate::record::Record;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use l2_common::{Error, Result};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writer settings shared by every partition file.
fn tsv_writer(file: File) -> Writer<File> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .quote(b'"')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(file)
}

/// One physical partition file.
pub struct PartitionedSink {
    path: PathBuf,
    fields: Vec<String>,
    writer: Option<Writer<File>>,
}

impl PartitionedSink {
    /// Bind a sink to `path` with the given column order. No I/O happens here.
    pub fn new(path: impl Into<PathBuf>, fields: Vec<String>) -> Self {
        Self {
            path: path.into(),
            fields,
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn create_writer(&self) -> Result<Writer<File>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = tsv_writer(file);
        if needs_header {
            writer.write_record(&self.fields)?;
            writer.flush()?;
        }
        debug!(path = %self.path.display(), needs_header, "opened partition file");
        Ok(writer)
    }

    fn open(&mut self) -> Result<&mut Writer<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.create_writer()?,
        };
        Ok(self.writer.insert(writer))
    }

    /// Encode `record` in column order and append it.
    ///
    /// Fields absent from the record are written empty; fields the sink does
    /// not know are rejected before anything is written. A closed sink
    /// reopens in append mode.
    pub fn write(&mut self, record: &Record) -> Result<()> {
        let unknown = record
            .keys()
            .find(|k| !self.fields.iter().any(|f| f.as_str() == *k));
        if let Some(unknown) = unknown {
            return Err(Error::SchemaMismatch(format!(
                "field '{unknown}' is not a column of {}",
                self.path.display()
            )));
        }
        let row: Vec<String> = self
            .fields
            .iter()
            .map(|f| record.get(f).map(|v| v.to_cell()).unwrap_or_default())
            .collect();
        self.write_row(&row)
    }

    /// Append one pre-encoded row. `row` must match the column count.
    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(Error::SchemaMismatch(format!(
                "row has {} cells, expected {}",
                row.len(),
                self.fields.len()
            )));
        }
        let writer = self.open()?;
        writer.write_record(row)?;
        writer.flush()?;
        Ok(())
    }

    /// Flush and release the file handle. Safe to call repeatedly.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(path = %self.path.display(), "closed partition file");
        }
        Ok(())
    }
}

impl fmt::Debug for PartitionedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedSink")
            .field("path", &self.path)
            .field("fields", &self.fields)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for PartitionedSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
