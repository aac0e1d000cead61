//! JSON document of a whole build.
//!
//! The document is self-describing: the date axis, every named series in bundle
//! order, the un-smoothed baselines used for summary statistics, and the risk
//! tables as loaded. Missing days are `null`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::app::pipeline::PipelineResult;
use crate::domain::RiskTable;
use crate::error::AppError;
use crate::series::Value;

#[derive(Debug, Serialize)]
pub struct BundleFile<'a> {
    pub tool: &'static str,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub days: usize,
    pub series: Vec<SeriesEntry<'a>>,
    pub baseline: BaselineEntry<'a>,
    pub risk_tables: &'a [RiskTable],
}

#[derive(Debug, Serialize)]
pub struct SeriesEntry<'a> {
    pub name: &'a str,
    pub values: &'a [Value],
}

#[derive(Debug, Serialize)]
pub struct BaselineEntry<'a> {
    pub mean: &'a [Value],
    pub sd: &'a [Value],
    pub aged_mean: &'a [Value],
    pub aged_sd: &'a [Value],
}

impl<'a> BundleFile<'a> {
    pub fn from_result(result: &'a PipelineResult) -> Self {
        Self {
            tool: "coviz",
            start: result.axis.start,
            end: result.axis.end(),
            days: result.days(),
            series: result
                .series()
                .into_iter()
                .map(|s| SeriesEntry {
                    name: s.name,
                    values: s.values,
                })
                .collect(),
            baseline: BaselineEntry {
                mean: &result.baseline.mean,
                sd: &result.baseline.sd,
                aged_mean: &result.baseline_aged.mean,
                aged_sd: &result.baseline_aged.sd,
            },
            risk_tables: &result.risk_tables,
        }
    }
}

/// Write the bundle JSON file.
pub fn write_bundle_json(path: &Path, result: &PipelineResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create bundle JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &BundleFile::from_result(result))
        .map_err(|e| AppError::input(format!("Failed to write bundle JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::build;
    use crate::data::synthetic::{SyntheticParams, generate_snapshot};
    use crate::domain::PipelineConfig;

    #[test]
    fn bundle_serializes_missing_as_null() {
        let snapshot = generate_snapshot(&SyntheticParams::default()).unwrap();
        let result = build(&snapshot, &PipelineConfig::default()).unwrap();

        let json = serde_json::to_value(BundleFile::from_result(&result)).unwrap();
        assert_eq!(json["tool"], "coviz");
        assert_eq!(json["days"], result.days());
        assert_eq!(json["series"][4]["name"], "incidence");
        assert!(json["series"][4]["values"][0].is_null());
        assert_eq!(
            json["baseline"]["mean"].as_array().unwrap().len(),
            result.days()
        );
    }
}
