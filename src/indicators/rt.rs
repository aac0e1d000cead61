//! Effective reproduction number estimate.

use super::SMOOTHING_WINDOW;
use crate::series::{Value, finite, mean, rolling_mean};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtParams {
    /// Length of the preceding window the current day is compared with.
    pub period: usize,
    pub ignore: usize,
    pub smoothing: usize,
}

impl Default for RtParams {
    fn default() -> Self {
        Self {
            period: 7,
            ignore: 15,
            smoothing: SMOOTHING_WINDOW,
        }
    }
}

impl RtParams {
    pub fn warmup(&self) -> usize {
        self.period + self.ignore + self.smoothing.saturating_sub(1)
    }
}

/// `new_cases[i] / mean(new_cases[i - period .. i])`, smoothed.
///
/// Missing when the window mean is missing or not positive.
pub fn reproduction_number(new_cases: &[Value], params: &RtParams) -> Vec<Value> {
    let start = params.period + params.ignore;
    let raw: Vec<Value> = (0..new_cases.len())
        .map(|i| {
            if i < start {
                return None;
            }
            let current = new_cases[i]?;
            let before = mean(&new_cases[i - params.period..i])?;
            if before <= 0.0 {
                return None;
            }
            finite(current / before)
        })
        .collect();

    rolling_mean(&raw, params.smoothing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::from_f64s;

    #[test]
    fn flat_epidemic_has_rt_one() {
        let params = RtParams { period: 7, ignore: 0, smoothing: 7 };
        let out = reproduction_number(&from_f64s(&[40.0; 30]), &params);
        assert_eq!(params.warmup(), 13);
        assert!(out[..13].iter().all(Option::is_none));
        for v in &out[13..] {
            assert!((v.unwrap() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn growth_pushes_rt_above_one() {
        let raw: Vec<f64> = (0..40).map(|i| 10.0 * 1.05f64.powi(i)).collect();
        let params = RtParams { period: 7, ignore: 0, smoothing: 1 };
        let out = reproduction_number(&from_f64s(&raw), &params);
        assert!(out[7..].iter().all(|v| v.unwrap() > 1.0));
    }

    #[test]
    fn zero_window_is_missing() {
        let mut raw = vec![0.0; 7];
        raw.push(5.0);
        let params = RtParams { period: 7, ignore: 0, smoothing: 1 };
        let out = reproduction_number(&from_f64s(&raw), &params);
        assert_eq!(out[7], None);
    }
}
