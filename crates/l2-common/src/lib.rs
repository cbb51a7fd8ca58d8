//! Shared types for the l2 experience logger.
//!
//! This crate provides foundational types used by both the write path
//! (`l2-logger`) and the read path (`l2-aggregate`):
//! - The error taxonomy shared by record validation and aggregation
//! - Log format versioning
//! - Worker and scenario identifiers
//! - Export format selection

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{Error, Result};
pub use id::{ScenarioDirName, WorkerId, DEFAULT_WORKER_ID};
pub use output::ExportFormat;
pub use schema::{LOG_FORMAT_VERSION, LEGACY_LOG_FORMAT_VERSION};
