//! Configuration for the l2 experience logger.
//!
//! This crate provides:
//! - `LoggerInfo`: declared metric columns and log format version
//! - `ScenarioInfo`: free-form scenario metadata with optional label checks
//! - Data root resolution (`L2DATA` → platform default)
//! - Aggregation options
//! - Tracing subscriber setup for drivers and tools

pub mod aggregate;
pub mod logger_info;
pub mod logging;
pub mod resolve;
pub mod scenario_info;

pub use aggregate::{AggregateConfig, RegimeKey};
pub use logger_info::LoggerInfo;
pub use logging::{init_tracing, LogFormat};
pub use resolve::{data_root, resolve_log_dir, L2DATA_ENV};
pub use scenario_info::ScenarioInfo;

/// File name of the logger metadata side file.
pub const LOGGER_INFO_FILE: &str = "logger_info.json";

/// File name of the scenario metadata side file.
pub const SCENARIO_INFO_FILE: &str = "scenario_info.json";
