//! Reporting utilities: red-line checks and formatted terminal output.

pub mod format;

pub use format::*;

use crate::app::pipeline::PipelineResult;
use crate::domain::RedLines;
use crate::series::Value;

/// Latest value of one headline indicator against its red line.
#[derive(Debug, Clone, PartialEq)]
pub struct RedLineCheck {
    pub indicator: &'static str,
    pub limit: f64,
    /// Last defined value and its day index.
    pub latest: Option<(usize, f64)>,
}

impl RedLineCheck {
    fn new(indicator: &'static str, limit: f64, series: &[Value]) -> Self {
        let latest = series
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, v)| v.map(|v| (i, v)));
        Self {
            indicator,
            limit,
            latest,
        }
    }

    /// `Some(true)` when the latest value is above the limit.
    pub fn exceeded(&self) -> Option<bool> {
        self.latest.map(|(_, v)| v > self.limit)
    }
}

/// Incidence, positivity, Rt and ICU occupancy against their red lines.
pub fn red_line_checks(result: &PipelineResult, limits: &RedLines) -> Vec<RedLineCheck> {
    vec![
        RedLineCheck::new("incidence", limits.incidence, &result.incidence),
        RedLineCheck::new("positivity", limits.positivity, &result.positivity),
        RedLineCheck::new("rt", limits.rt, &result.rt),
        RedLineCheck::new("icu", limits.icu, &result.icu),
    ]
}
