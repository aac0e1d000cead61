//! Historical all-cause mortality baseline.
//!
//! For every day of the epidemic axis the baseline is the mean and standard
//! deviation of the same day-of-year in the five pre-pandemic reference years
//! (2015 to 2019). Day-of-year indexing wraps modulo 365, so the extra day of
//! 2016 is never visited and the calendar drifts by one day per leap year over a
//! long span. That approximation is accepted.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::domain::{DailySeries, day_of_year};
use crate::error::AppError;
use crate::series::{Value, finite, rolling_mean};

pub const FIRST_REFERENCE_YEAR: i32 = 2015;
pub const LAST_REFERENCE_YEAR: i32 = 2019;

/// Yearly growth of all-cause deaths attributed to population aging.
pub const AGING_DEATHS_PER_YEAR: f64 = 966.99;

const CYCLE: usize = 365;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineParams {
    /// Day-of-year index of axis day 0. `None` derives it from the axis start.
    pub anchor: Option<usize>,
    pub aging_per_year: f64,
    pub smoothing: usize,
}

impl Default for BaselineParams {
    fn default() -> Self {
        Self {
            anchor: None,
            aging_per_year: AGING_DEATHS_PER_YEAR,
            smoothing: crate::indicators::SMOOTHING_WINDOW,
        }
    }
}

impl BaselineParams {
    pub fn anchor_for(&self, start: NaiveDate) -> usize {
        self.anchor.unwrap_or_else(|| day_of_year(start)) % CYCLE
    }
}

/// Daily values of each reference year, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceYears {
    pub years: Vec<(i32, Vec<Value>)>,
}

impl ReferenceYears {
    /// Slice 01-01-2015 ..= 31-12-2019 out of a long mortality series.
    ///
    /// Both bounds are located by exact date; a series that does not cover them
    /// is a data error.
    pub fn from_series(series: &DailySeries) -> Result<Self, AppError> {
        let (from, to) = reference_bounds()?;
        let slice = series.between(from, to).ok_or_else(|| {
            AppError::data(format!(
                "Mortality series ({} days from {}) does not cover {} to {}.",
                series.len(),
                series.start.format("%d-%m-%Y"),
                from.format("%d-%m-%Y"),
                to.format("%d-%m-%Y"),
            ))
        })?;

        let mut years = Vec::new();
        let mut offset = 0;
        for year in FIRST_REFERENCE_YEAR..=LAST_REFERENCE_YEAR {
            let len = days_in_year(year);
            years.push((year, slice[offset..offset + len].to_vec()));
            offset += len;
        }
        Ok(Self { years })
    }

    pub fn total_days(&self) -> usize {
        self.years.iter().map(|(_, v)| v.len()).sum()
    }

    /// Project every year to the level of the last reference year by adding
    /// `per_year / 365` deaths per day for each year of distance.
    pub fn with_aging(&self, per_year: f64) -> Self {
        let daily = per_year / CYCLE as f64;
        let years = self
            .years
            .iter()
            .map(|(year, values)| {
                let shift = daily * f64::from(LAST_REFERENCE_YEAR - year);
                let values = values.iter().map(|v| v.and_then(|x| finite(x + shift))).collect();
                (*year, values)
            })
            .collect();
        Self { years }
    }

    /// Values of every year at one day-of-year index.
    fn at(&self, doy: usize) -> Vec<Value> {
        self.years
            .iter()
            .map(|(_, values)| values.get(doy).copied().flatten())
            .collect()
    }
}

/// Baseline over an axis of `span` days.
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityBaseline {
    /// Un-smoothed; the only series used in summary statistics.
    pub mean: Vec<Value>,
    pub sd: Vec<Value>,
    pub inf: Vec<Value>,
    pub sup: Vec<Value>,
    pub mean_smoothed: Vec<Value>,
    pub inf_smoothed: Vec<Value>,
    pub sup_smoothed: Vec<Value>,
}

/// Baseline for `span` days starting at day-of-year `anchor`.
///
/// With `drift` set, `drift / 365` deaths per day are added to the mean for
/// every full year elapsed since the anchor, continuing the aging trend past
/// the first year of the span.
pub fn baseline(
    reference: &ReferenceYears,
    span: usize,
    anchor: usize,
    drift: Option<f64>,
    smoothing: usize,
) -> MortalityBaseline {
    let daily_drift = drift.map(|per_year| per_year / CYCLE as f64);

    let mut mean = Vec::with_capacity(span);
    let mut sd = Vec::with_capacity(span);
    for d in 0..span {
        let doy = (anchor + d) % CYCLE;
        let (m, s) = mean_sd(&reference.at(doy));
        let elapsed = (d / CYCLE) as f64;
        let m = match daily_drift {
            Some(rate) if elapsed > 0.0 => m.and_then(|m| finite(m + rate * elapsed)),
            _ => m,
        };
        mean.push(m);
        sd.push(s);
    }

    let band = |sign: f64| -> Vec<Value> {
        mean.iter()
            .zip(&sd)
            .map(|(m, s)| Some((*m)? + sign * (*s)?))
            .collect()
    };
    let inf = band(-1.0);
    let sup = band(1.0);

    debug!(span, anchor, aged = drift.is_some(), "mortality baseline computed");
    MortalityBaseline {
        mean_smoothed: rolling_mean(&mean, smoothing),
        inf_smoothed: rolling_mean(&inf, smoothing),
        sup_smoothed: rolling_mean(&sup, smoothing),
        mean,
        sd,
        inf,
        sup,
    }
}

/// Slice the reference years out of `series` and build the baseline for an
/// axis starting at `start`. `aged` applies the aging correction from `params`.
pub fn baseline_for_axis(
    series: &DailySeries,
    start: NaiveDate,
    span: usize,
    params: &BaselineParams,
    aged: bool,
) -> Result<MortalityBaseline, AppError> {
    let reference = ReferenceYears::from_series(series)?;
    let anchor = params.anchor_for(start);
    if aged {
        let corrected = reference.with_aging(params.aging_per_year);
        Ok(baseline(&corrected, span, anchor, Some(params.aging_per_year), params.smoothing))
    } else {
        Ok(baseline(&reference, span, anchor, None, params.smoothing))
    }
}

/// Mean and sample standard deviation; both missing if any value is missing.
fn mean_sd(values: &[Value]) -> (Value, Value) {
    let present: Option<Vec<f64>> = values.iter().copied().collect();
    let Some(xs) = present else {
        return (None, None);
    };
    if xs.is_empty() {
        return (None, None);
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    if xs.len() < 2 {
        return (finite(mean), Some(0.0));
    }
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (finite(mean), finite(var.sqrt()))
}

fn reference_bounds() -> Result<(NaiveDate, NaiveDate), AppError> {
    let from = NaiveDate::from_ymd_opt(FIRST_REFERENCE_YEAR, 1, 1);
    let to = NaiveDate::from_ymd_opt(LAST_REFERENCE_YEAR, 12, 31);
    from.zip(to)
        .ok_or_else(|| AppError::data("Invalid reference-year bounds."))
}

fn days_in_year(year: i32) -> usize {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() { 366 } else { 365 }
}

/// Calendar day (month, day) of a reference-year index, for labels.
pub fn reference_date(year: i32, doy: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)?.with_ordinal0(doy as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::from_f64s;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Daily series from 2009 where each value encodes its date as
    /// `year * 1000 + ordinal0`.
    fn encoded_series() -> DailySeries {
        let start = d(2009, 1, 1);
        let end = d(2021, 12, 31);
        let values = start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(|day| Some(f64::from(day.year()) * 1000.0 + f64::from(day.ordinal0())))
            .collect();
        DailySeries::new(start, values)
    }

    #[test]
    fn reference_slice_covers_leap_year() {
        let reference = ReferenceYears::from_series(&encoded_series()).unwrap();
        assert_eq!(reference.total_days(), 1826);
        let lens: Vec<usize> = reference.years.iter().map(|(_, v)| v.len()).collect();
        assert_eq!(lens, vec![365, 366, 365, 365, 365]);
        assert_eq!(reference.years[1].1[365], Some(2016.0 * 1000.0 + 365.0));
    }

    #[test]
    fn anchor_day_is_26_february_of_each_year() {
        let series = encoded_series();
        let reference = ReferenceYears::from_series(&series).unwrap();
        let anchor = BaselineParams::default().anchor_for(d(2020, 2, 26));
        assert_eq!(anchor, 56);
        for (year, values) in &reference.years {
            let feb26 = d(*year, 2, 26);
            assert_eq!(reference_date(*year, anchor), Some(feb26));
            assert_eq!(values[anchor], series.between(feb26, feb26).unwrap()[0]);
        }
    }

    #[test]
    fn mean_and_sd_across_years() {
        // Constant per year: 100, 110, 120, 130, 140.
        let start = d(2015, 1, 1);
        let mut values = Vec::new();
        for (k, year) in (2015..=2019).enumerate() {
            values.extend(std::iter::repeat_n(100.0 + 10.0 * k as f64, days_in_year(year)));
        }
        let series = DailySeries::new(start, from_f64s(&values));
        let reference = ReferenceYears::from_series(&series).unwrap();

        let b = baseline(&reference, 30, 56, None, 7);
        let sd = 250.0f64.sqrt();
        assert!(b.mean.iter().all(|m| (m.unwrap() - 120.0).abs() < 1e-9));
        for ((lo, hi), s) in b.inf.iter().zip(&b.sup).zip(&b.sd) {
            assert!((s.unwrap() - sd).abs() < 1e-9);
            assert!((lo.unwrap() - (120.0 - sd)).abs() < 1e-9);
            assert!((hi.unwrap() - (120.0 + sd)).abs() < 1e-9);
        }
        assert!(b.mean_smoothed[..6].iter().all(Option::is_none));
        assert!((b.mean_smoothed[6].unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn aging_lifts_older_years_to_2019_level() {
        let start = d(2015, 1, 1);
        let values = vec![10.0; 1826];
        let series = DailySeries::new(start, from_f64s(&values));
        let reference = ReferenceYears::from_series(&series).unwrap().with_aging(365.0);

        let firsts: Vec<f64> = reference.years.iter().map(|(_, v)| v[0].unwrap()).collect();
        assert_eq!(firsts, vec![14.0, 13.0, 12.0, 11.0, 10.0]);
    }

    #[test]
    fn drift_applies_after_first_year_of_span() {
        let series = DailySeries::new(d(2015, 1, 1), from_f64s(&vec![10.0; 1826]));
        let reference = ReferenceYears::from_series(&series).unwrap();
        let b = baseline(&reference, 800, 0, Some(365.0), 1);
        assert_eq!(b.mean[364], Some(10.0));
        assert_eq!(b.mean[365], Some(11.0));
        assert_eq!(b.mean[730], Some(12.0));
    }

    #[test]
    fn missing_reference_day_propagates() {
        let mut values = from_f64s(&vec![10.0; 1826]);
        // 2017-01-01 sits at index 365 + 366.
        values[731] = None;
        let series = DailySeries::new(d(2015, 1, 1), values);
        let reference = ReferenceYears::from_series(&series).unwrap();
        let b = baseline(&reference, 3, 0, None, 1);
        assert_eq!(b.mean[0], None);
        assert_eq!(b.inf[0], None);
        assert_eq!(b.mean[1], Some(10.0));
    }

    #[test]
    fn short_series_is_a_data_error() {
        let series = DailySeries::new(d(2016, 1, 1), from_f64s(&[1.0; 2000]));
        assert_eq!(ReferenceYears::from_series(&series).unwrap_err().exit_code(), 3);
    }
}
