//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the age-band vocabulary (`AgeBand`) and its report column names
//! - the date axis and dated series (`DateAxis`, `DailySeries`)
//! - the loaded snapshot (`Snapshot` and its tables)
//! - run configuration (`PipelineConfig`, `RedLines`)

pub mod types;

pub use types::*;
