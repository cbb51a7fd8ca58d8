//! Export formats for merged log tables.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delimited format for an exported, aggregated dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values.
    #[default]
    Csv,
    /// Tab-separated values, the on-disk partition format.
    Tsv,
}

impl ExportFormat {
    /// Field delimiter byte for this format.
    pub fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Tsv => b'\t',
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiters() {
        assert_eq!(ExportFormat::Csv.delimiter(), b',');
        assert_eq!(ExportFormat::Tsv.delimiter(), b'\t');
    }

    #[test]
    fn test_value_enum_parsing() {
        assert_eq!(ExportFormat::from_str("tsv", true), Ok(ExportFormat::Tsv));
        assert!(ExportFormat::from_str("feather", true).is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ExportFormat::Tsv).unwrap();
        assert_eq!(json, "\"tsv\"");
    }
}
