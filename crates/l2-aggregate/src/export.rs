//! Delimited export of a dataset.

use crate::dataset::Dataset;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use l2_common::{ExportFormat, Result};
use std::io::Write;

/// Write `dataset` with a header row as CSV or TSV.
pub fn write_delimited<W: Write>(dataset: &Dataset, writer: W, format: ExportFormat) -> Result<()> {
    let mut out = WriterBuilder::new()
        .delimiter(format.delimiter())
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    out.write_record(dataset.columns())?;
    for row in dataset.rows() {
        out.write_record(row)?;
    }
    out.flush()?;
    Ok(())
}
