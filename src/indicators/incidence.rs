//! 14-day incidence per 100k.

use crate::series::{Value, finite, rolling_sum};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidenceParams {
    pub period: usize,
    /// Population in units of 100k.
    pub divider: f64,
}

impl IncidenceParams {
    pub fn for_population(population: f64) -> Self {
        Self {
            period: 14,
            divider: population / 100_000.0,
        }
    }

    pub fn warmup(&self) -> usize {
        self.period.saturating_sub(1)
    }
}

/// Sum of new cases over the trailing `period` days (current day included),
/// divided by `divider`.
pub fn incidence(new_cases: &[Value], params: &IncidenceParams) -> Vec<Value> {
    if params.divider <= 0.0 {
        return vec![None; new_cases.len()];
    }
    rolling_sum(new_cases, params.period)
        .into_iter()
        .map(|v| v.and_then(|sum| finite(sum / params.divider)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::from_f64s;

    fn zeros_then_tens() -> Vec<Value> {
        let mut raw = vec![0.0; 14];
        raw.extend(std::iter::repeat_n(10.0, 30));
        from_f64s(&raw)
    }

    #[test]
    fn warmup_then_ramp_to_full_window() {
        let params = IncidenceParams { period: 14, divider: 1.0 };
        let out = incidence(&zeros_then_tens(), &params);

        assert_eq!(params.warmup(), 13);
        assert!(out[..13].iter().all(Option::is_none));
        assert_eq!(out[13], Some(0.0));
        assert_eq!(out[14], Some(10.0));
        assert_eq!(out[26], Some(130.0));
        assert_eq!(out[27], Some(140.0));
        assert!(out[27..].iter().all(|v| *v == Some(140.0)));
    }

    #[test]
    fn divider_scales_to_per_100k() {
        let params = IncidenceParams::for_population(200_000.0);
        assert!((params.divider - 2.0).abs() < 1e-12);
        let out = incidence(&zeros_then_tens(), &params);
        assert_eq!(out[40], Some(70.0));
    }

    #[test]
    fn non_positive_divider_yields_missing() {
        let params = IncidenceParams { period: 2, divider: 0.0 };
        assert!(incidence(&zeros_then_tens(), &params).iter().all(Option::is_none));
    }
}
