//! Case fatality rate with a delayed denominator.
//!
//! Deaths lag infections by `delay` days on average, so deaths on day `i` are
//! compared with new cases around day `i - delay`, averaged over a 7-day window
//! (`rewind` days back through `rewind` days forward).

use super::SMOOTHING_WINDOW;
use crate::error::AppError;
use crate::series::{Value, ensure_aligned, finite, mean, rolling_mean};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfrParams {
    pub delay: usize,
    pub ignore: usize,
    pub rewind: usize,
    pub smoothing: usize,
}

impl Default for CfrParams {
    fn default() -> Self {
        Self {
            delay: 14,
            ignore: 15,
            rewind: 3,
            smoothing: SMOOTHING_WINDOW,
        }
    }
}

impl CfrParams {
    /// First day with a raw ratio.
    pub fn first_day(&self) -> usize {
        self.delay + self.ignore + self.rewind
    }

    pub fn warmup(&self) -> usize {
        self.first_day() + self.smoothing.saturating_sub(1)
    }
}

/// Daily CFR in percent, smoothed.
///
/// - A missing death count gives a missing day.
/// - A window average that is missing gives a missing day.
/// - A window average `<= 0` gives exactly `0`.
/// - Negative ratios (death-count corrections) are clamped to `0`.
///
/// The forward half of the window is cut at the end of the series when
/// `delay < rewind`.
pub fn case_fatality_rate(
    deaths: &[Value],
    new_cases: &[Value],
    params: &CfrParams,
) -> Result<Vec<Value>, AppError> {
    ensure_aligned("case fatality rate", deaths.len(), &[new_cases])?;

    let len = deaths.len();
    let raw: Vec<Value> = (0..len)
        .map(|i| {
            if i < params.first_day() {
                return None;
            }
            let died = deaths[i]?;
            let center = i - params.delay;
            let lo = center - params.rewind;
            let hi = (center + params.rewind + 1).min(len);
            let cases = mean(&new_cases[lo..hi])?;
            if cases <= 0.0 {
                return Some(0.0);
            }
            finite((100.0 * died / cases).max(0.0))
        })
        .collect();

    Ok(rolling_mean(&raw, params.smoothing))
}
