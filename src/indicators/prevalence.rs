//! Prevalence envelope: best case, worst case and their average, in percent of
//! the population.
//!
//! The best case counts only the cases found in the last `period` days. The
//! worst case adds the untested part of the population that was not already
//! found positive in the previous `immunity_window` days, multiplied by the
//! current positivity.

use super::SMOOTHING_WINDOW;
use crate::error::AppError;
use crate::series::{Value, combine, ensure_aligned, finite, nansum, rolling_mean, rolling_sum};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrevalenceParams {
    pub period: usize,
    pub immunity_window: usize,
    pub population: f64,
    pub smoothing: usize,
}

impl PrevalenceParams {
    pub fn for_population(population: f64) -> Self {
        Self {
            period: 7,
            immunity_window: 180,
            population,
            smoothing: SMOOTHING_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrevalenceEnvelope {
    pub min: Vec<Value>,
    pub max: Vec<Value>,
    pub avg: Vec<Value>,
}

/// `positivity` is the smoothed percentage series from [`super::positivity`];
/// `tests` must already sit on the same axis as `new_cases`.
pub fn prevalence(
    new_cases: &[Value],
    tests: &[Value],
    positivity: &[Value],
    params: &PrevalenceParams,
) -> Result<PrevalenceEnvelope, AppError> {
    let len = new_cases.len();
    ensure_aligned("prevalence", len, &[tests, positivity])?;

    if params.population <= 0.0 {
        let empty = vec![None; len];
        return Ok(PrevalenceEnvelope {
            min: empty.clone(),
            max: empty.clone(),
            avg: empty,
        });
    }
    let pop = params.population;

    let raw_min: Vec<Value> = rolling_sum(new_cases, params.period)
        .into_iter()
        .map(|v| v.and_then(|sum| finite(100.0 * sum / pop)))
        .collect();

    let raw_max: Vec<Value> = (0..len)
        .map(|i| {
            let known = nansum(&new_cases[i.saturating_sub(params.immunity_window)..i]);
            let untested = combine(tests[i], Some(known), |t, k| 1.0 - t / pop - k / pop);
            let extra = combine(untested, positivity[i], |u, p| u * p);
            combine(raw_min[i], extra, |m, e| m + e)
        })
        .collect();

    let min = rolling_mean(&raw_min, params.smoothing);
    let max = rolling_mean(&raw_max, params.smoothing);
    let avg = min
        .iter()
        .zip(&max)
        .map(|(lo, hi)| combine(*lo, *hi, |a, b| (a + b) / 2.0))
        .collect();

    Ok(PrevalenceEnvelope { min, max, avg })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::from_f64s;

    fn params() -> PrevalenceParams {
        PrevalenceParams { period: 7, immunity_window: 180, population: 1000.0, smoothing: 1 }
    }

    #[test]
    fn min_is_trailing_share_of_population() {
        let new = from_f64s(&[1.0; 20]);
        let tests = from_f64s(&[0.0; 20]);
        let positivity = vec![None; 20];

        let env = prevalence(&new, &tests, &positivity, &params()).unwrap();
        assert!(env.min[..6].iter().all(Option::is_none));
        for v in &env.min[6..] {
            assert!((v.unwrap() - 0.7).abs() < 1e-12);
        }
        assert!(env.max.iter().all(Option::is_none));
        assert!(env.avg.iter().all(Option::is_none));
    }

    #[test]
    fn max_adds_untested_fraction_times_positivity() {
        let new = from_f64s(&[1.0; 20]);
        let tests = from_f64s(&[100.0; 20]);
        let positivity = from_f64s(&[5.0; 20]);

        let env = prevalence(&new, &tests, &positivity, &params()).unwrap();
        // Day 10: min 0.7, 10 earlier positives, untested share 1 - 0.1 - 0.01.
        let expected = 0.7 + 0.89 * 5.0;
        assert!((env.max[10].unwrap() - expected).abs() < 1e-12);
        let mid = (0.7 + expected) / 2.0;
        assert!((env.avg[10].unwrap() - mid).abs() < 1e-12);
    }

    #[test]
    fn previous_positives_are_capped_by_immunity_window() {
        let new = from_f64s(&[2.0; 30]);
        let tests = from_f64s(&[0.0; 30]);
        let positivity = from_f64s(&[10.0; 30]);
        let p = PrevalenceParams { immunity_window: 5, ..params() };

        let env = prevalence(&new, &tests, &positivity, &p).unwrap();
        // min 1.4; 5 days * 2 = 10 known positives.
        let expected = 1.4 + (1.0 - 0.01) * 10.0;
        assert!((env.max[25].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn min_never_exceeds_max_with_positive_inputs() {
        let new = from_f64s(&(0..60).map(|i| (i % 9) as f64 + 1.0).collect::<Vec<_>>());
        let tests = from_f64s(&[50.0; 60]);
        let positivity = from_f64s(&[3.0; 60]);
        let p = PrevalenceParams { smoothing: 7, ..params() };

        let env = prevalence(&new, &tests, &positivity, &p).unwrap();
        for ((lo, hi), avg) in env.min.iter().zip(&env.max).zip(&env.avg) {
            if let (Some(lo), Some(hi), Some(avg)) = (lo, hi, avg) {
                assert!(lo <= avg && avg <= hi);
            }
        }
    }

    #[test]
    fn misaligned_tests_fail() {
        let err = prevalence(&from_f64s(&[1.0; 5]), &from_f64s(&[1.0; 4]), &from_f64s(&[1.0; 5]), &params())
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
