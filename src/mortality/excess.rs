//! Re-aggregation over a date range: totals, excess deaths and correlation.
//!
//! These are read-only scans over an already built [`PipelineResult`]. They use
//! `nansum` so that a range with partial data still gives a best-effort number,
//! and they always use the un-smoothed baseline.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::app::pipeline::PipelineResult;
use crate::domain::DateAxis;
use crate::error::AppError;
use crate::math::{LinearFit, fit_line};
use crate::series::{Value, nansum, zip_with};

/// Label of the all-ages row, computed with the aging-corrected baseline.
pub const ALL_AGES_LABEL: &str = "all ages*";

/// A resolved, inclusive index range on the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub lo: usize,
    pub hi: usize,
}

impl DayRange {
    pub fn days(&self) -> usize {
        self.hi - self.lo + 1
    }

    fn slice<'a>(&self, values: &'a [Value]) -> &'a [Value] {
        let hi = (self.hi + 1).min(values.len());
        &values[self.lo.min(hi)..hi]
    }
}

/// Resolve `from..=to` on `axis`.
///
/// Inverted bounds are swapped; dates outside the axis are clamped to it.
pub fn resolve_range(axis: &DateAxis, from: NaiveDate, to: NaiveDate) -> Result<DayRange, AppError> {
    let Some(end) = axis.end() else {
        return Err(AppError::data("Cannot aggregate over an empty axis."));
    };
    let (from, to) = if from <= to { (from, to) } else { (to, from) };

    let clamp = |date: NaiveDate, what: &str| -> NaiveDate {
        let clamped = date.clamp(axis.start, end);
        if clamped != date {
            warn!(%date, %clamped, bound = what, "range bound outside the data; clamped");
        }
        clamped
    };
    let from = clamp(from, "from");
    let to = clamp(to, "to");

    let lo = axis.index_of(from).unwrap_or(0);
    let hi = axis.index_of(to).unwrap_or(axis.len - 1);
    Ok(DayRange { from, to, lo, hi })
}

/// Deaths, baseline and their difference over a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortalityRow {
    pub label: String,
    pub deaths: f64,
    pub baseline: f64,
    pub excess: f64,
    /// Excess as a percentage of the baseline; `None` when the baseline is not positive.
    pub excess_pct: Option<f64>,
}

impl MortalityRow {
    pub fn new(label: impl Into<String>, deaths: &[Value], baseline: &[Value]) -> Self {
        let deaths = nansum(deaths);
        let baseline = nansum(baseline);
        let excess = deaths - baseline;
        Self {
            label: label.into(),
            deaths,
            baseline,
            excess,
            excess_pct: (baseline > 0.0).then(|| 100.0 * excess / baseline),
        }
    }
}

/// Totals over a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeTotals {
    pub new_cases: f64,
    pub covid_deaths: f64,
    pub total_deaths: f64,
    pub baseline: f64,
    pub excess: f64,
    pub excess_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: usize,
    pub totals: RangeTotals,
    /// One row per mortality band, then [`ALL_AGES_LABEL`].
    pub bands: Vec<MortalityRow>,
}

/// Sum the raw series of `result` over `from..=to`.
pub fn summarize_range(result: &PipelineResult, from: NaiveDate, to: NaiveDate) -> Result<RangeSummary, AppError> {
    let range = resolve_range(&result.axis, from, to)?;

    let all = MortalityRow::new("all ages", range.slice(&result.total_deaths), range.slice(&result.baseline.mean));
    let totals = RangeTotals {
        new_cases: nansum(range.slice(&result.new_cases)),
        covid_deaths: nansum(range.slice(&result.covid_deaths)),
        total_deaths: all.deaths,
        baseline: all.baseline,
        excess: all.excess,
        excess_pct: all.excess_pct,
    };

    let mut bands: Vec<MortalityRow> = result
        .age_mortality
        .iter()
        .map(|m| MortalityRow::new(m.label.clone(), range.slice(&m.deaths), range.slice(&m.baseline.mean)))
        .collect();
    bands.push(MortalityRow::new(
        ALL_AGES_LABEL,
        range.slice(&result.total_deaths),
        range.slice(&result.baseline_aged.mean),
    ));

    Ok(RangeSummary {
        from: range.from,
        to: range.to,
        days: range.days(),
        totals,
        bands,
    })
}

/// Daily excess deaths: all-cause deaths minus the un-smoothed baseline mean.
pub fn daily_excess(result: &PipelineResult) -> Result<Vec<Value>, AppError> {
    zip_with("excess deaths", &result.total_deaths, &result.baseline.mean, |d, b| d - b)
}

/// Fit Covid deaths (x) against daily excess deaths (y) over a range.
pub fn correlate_range(
    result: &PipelineResult,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Option<LinearFit>, AppError> {
    let range = resolve_range(&result.axis, from, to)?;
    let excess = daily_excess(result)?;
    fit_line(range.slice(&result.covid_deaths), range.slice(&excess))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::build;
    use crate::data::synthetic::{SyntheticParams, generate_snapshot};
    use crate::domain::PipelineConfig;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn result() -> PipelineResult {
        let snapshot = generate_snapshot(&SyntheticParams::default()).unwrap();
        build(&snapshot, &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn range_is_clamped_and_swapped() {
        let axis = DateAxis::new(d(2020, 2, 26), 10);
        let r = resolve_range(&axis, d(2020, 3, 20), d(2020, 1, 1)).unwrap();
        assert_eq!((r.lo, r.hi), (0, 9));
        assert_eq!(r.from, d(2020, 2, 26));
        assert_eq!(r.to, d(2020, 3, 6));
        assert_eq!(r.days(), 10);
    }

    #[test]
    fn excess_is_zero_when_deaths_equal_baseline() {
        let mut result = result();
        result.total_deaths = result.baseline.mean.clone();
        let start = result.axis.start;
        let summary = summarize_range(&result, start, d(2020, 12, 31)).unwrap();
        assert!(summary.totals.excess.abs() < 1e-6);
        assert!(summary.totals.excess_pct.unwrap().abs() < 1e-9);
    }

    #[test]
    fn excess_uses_unsmoothed_baseline() {
        let result = result();
        let start = result.axis.start;
        let to = d(2020, 6, 30);
        let summary = summarize_range(&result, start, to).unwrap();
        let range = resolve_range(&result.axis, start, to).unwrap();

        let expected = nansum(range.slice(&result.baseline.mean));
        assert!((summary.totals.baseline - expected).abs() < 1e-9);
        let smoothed = nansum(range.slice(&result.baseline.mean_smoothed));
        assert!((summary.totals.baseline - smoothed).abs() > 1e-9);
    }

    #[test]
    fn bands_end_with_aging_corrected_all_ages_row() {
        let result = result();
        let summary = summarize_range(&result, result.axis.start, d(2021, 3, 1)).unwrap();
        assert_eq!(summary.bands.len(), result.age_mortality.len() + 1);
        let last = summary.bands.last().unwrap();
        assert_eq!(last.label, ALL_AGES_LABEL);
        assert!((last.deaths - summary.totals.total_deaths).abs() < 1e-9);
        assert!(last.baseline > summary.totals.baseline);
    }

    #[test]
    fn missing_days_count_as_zero_in_sums() {
        let row = MortalityRow::new("x", &[Some(10.0), None, Some(5.0)], &[Some(4.0), Some(4.0), None]);
        assert_eq!(row.deaths, 15.0);
        assert_eq!(row.baseline, 8.0);
        assert_eq!(row.excess, 7.0);
        assert!((row.excess_pct.unwrap() - 87.5).abs() < 1e-12);

        let empty = MortalityRow::new("y", &[Some(1.0)], &[None]);
        assert_eq!(empty.excess_pct, None);
    }

    #[test]
    fn correlation_over_range_uses_covid_and_excess_deaths() {
        let result = result();
        let fit = correlate_range(&result, result.axis.start, d(2021, 6, 30)).unwrap();
        let fit = fit.unwrap();
        assert!(fit.n > 30);
        assert!(fit.r.is_some_and(|r| (-1.0..=1.0).contains(&r)));
    }
}
