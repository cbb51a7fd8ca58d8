//! Static JSON side files written once per logger.

use l2_common::Result;
use l2_config::{LoggerInfo, ScenarioInfo, LOGGER_INFO_FILE, SCENARIO_INFO_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes `logger_info.json` and `scenario_info.json` into a scenario directory.
#[derive(Debug, Clone)]
pub struct MetadataWriter {
    scenario_dir: PathBuf,
}

impl MetadataWriter {
    pub fn new(scenario_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenario_dir: scenario_dir.into(),
        }
    }

    pub fn scenario_dir(&self) -> &Path {
        &self.scenario_dir
    }

    /// Create the scenario directory and write both side files.
    ///
    /// Existing side files are overwritten.
    pub fn write(&self, logger_info: &LoggerInfo, scenario_info: &ScenarioInfo) -> Result<()> {
        fs::create_dir_all(&self.scenario_dir)?;
        self.write_file(LOGGER_INFO_FILE, &logger_info.to_json_pretty()?)?;
        self.write_file(SCENARIO_INFO_FILE, &scenario_info.to_json_pretty()?)?;
        Ok(())
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.scenario_dir.join(name);
        fs::write(&path, contents)?;
        debug!(path = %path.display(), "wrote metadata file");
        Ok(())
    }
}
